//! Schema description of a configuration struct
//!
//! The `#[derive(Config)]` macro implements [`Schema`] and [`Walk`] for a
//! struct. Only fields carrying a source key take part in resolution and
//! validation; everything else is not configuration.

use crate::Result;
use crate::resolver::FieldResolver;
use crate::value::ConfigValue;

/// Static description of one top-level configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    key: &'static str,
    namespace: Option<&'static str>,
    override_namespace: Option<&'static str>,
    required: bool,
    rules: &'static str,
}

impl FieldDescriptor {
    pub const fn new(
        key: &'static str,
        namespace: Option<&'static str>,
        override_namespace: Option<&'static str>,
        required: bool,
        rules: &'static str,
    ) -> Self {
        Self {
            key,
            namespace,
            override_namespace,
            required,
            rules,
        }
    }

    /// Key the value is stored under in every namespace.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Explicit primary namespace; `None` means the resolver default.
    pub fn namespace(&self) -> Option<&'static str> {
        self.namespace
    }

    pub fn override_namespace(&self) -> Option<&'static str> {
        self.override_namespace
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Raw rule string, e.g. `required,oneof=us-east-1 us-west-1`.
    pub fn rules(&self) -> &'static str {
        self.rules
    }
}

/// Field metadata handed to a [`FieldVisitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    pub key: &'static str,
    pub rules: &'static str,
}

impl FieldMeta {
    pub const fn new(key: &'static str, rules: &'static str) -> Self {
        Self { key, rules }
    }
}

/// Receives every configuration field of a struct, in declaration order.
pub trait FieldVisitor {
    fn visit(&mut self, meta: &FieldMeta, value: &mut dyn ConfigValue);
}

/// Hands each configuration field of a struct to a visitor.
pub trait Walk {
    fn walk(&mut self, visitor: &mut dyn FieldVisitor);
}

/// A struct that can be populated by the resolver.
pub trait Schema: Walk + Sized {
    /// Configuration fields in declaration order.
    fn descriptors() -> &'static [FieldDescriptor];

    /// Resolve every configuration field through `fields`, in declaration order.
    fn resolve_fields(&mut self, fields: &mut FieldResolver<'_>) -> Result<()>;
}
