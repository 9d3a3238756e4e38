//! Per-call registry of validation rules

use super::builtin::{DefaultValue, EnvFallback, Max, Min, OMIT_EMPTY, OneOf, Required};
use super::rule::{FieldRule, Rule, TypedStructRule, parse_rules};
use super::{ValidationError, ValidationErrors};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::schema::{FieldMeta, FieldVisitor, Walk};
use crate::value::ConfigValue;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Rules available to one validation pass.
///
/// Field rules are keyed by tag; registering a tag that already exists
/// replaces the earlier rule. Struct rules are keyed by the type they
/// validate and run, in registration order, once every field of a value of
/// that type has been visited. This holds for the root and for nested
/// structs alike.
///
/// # Example
///
/// ```
/// use layerconf::{ConfigValue, FieldValidation, RuleRegistry};
///
/// let mut registry = RuleRegistry::with_standard();
/// registry.register_field(FieldValidation::new(
///     "even",
///     |value: &dyn ConfigValue, _: Option<&str>| {
///         value.numeric().is_some_and(|n| n % 2.0 == 0.0)
///     },
/// ));
/// assert!(registry.has_field_rule("even"));
/// assert!(registry.has_field_rule("required"));
/// ```
pub struct RuleRegistry {
    field_rules: HashMap<String, Box<dyn FieldRule>>,
    struct_rules: Vec<TypedStructRule>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Create a registry without any rules.
    pub fn new() -> Self {
        Self {
            field_rules: HashMap::new(),
            struct_rules: Vec::new(),
        }
    }

    /// Create a registry with `required`, `oneof`, `min` and `max`.
    ///
    /// `omitempty` is handled by the walker itself and is always available.
    pub fn with_standard() -> Self {
        let mut registry = Self::new();
        registry.register_field(Required);
        registry.register_field(OneOf);
        registry.register_field(Min);
        registry.register_field(Max);
        registry
    }

    /// Register `default` and `env`, replacing any rule using those tags.
    pub fn register_builtins(&mut self, environment: Arc<dyn Environment>) {
        self.register_field(DefaultValue);
        self.register_field(EnvFallback::new(environment));
    }

    pub fn register(&mut self, rule: Rule) {
        match rule {
            Rule::Field(rule) => self.insert_field(rule),
            Rule::Struct(rule) => {
                tracing::debug!(rule = rule.name(), target = rule.target_name(), "Registered struct rule");
                self.struct_rules.push(rule);
            }
        }
    }

    pub fn register_field(&mut self, rule: impl FieldRule + 'static) {
        self.insert_field(Box::new(rule));
    }

    fn insert_field(&mut self, rule: Box<dyn FieldRule>) {
        let tag = rule.tag().to_string();
        if self.field_rules.insert(tag.clone(), rule).is_some() {
            tracing::debug!(tag = %tag, "Field rule replaced by a later registration");
        }
    }

    pub fn has_field_rule(&self, tag: &str) -> bool {
        tag == OMIT_EMPTY || self.field_rules.contains_key(tag)
    }

    pub fn struct_rule_count(&self) -> usize {
        self.struct_rules.len()
    }

    /// Run every field rule over `target`, then the struct rules of each
    /// nested struct and finally those of `target` itself.
    ///
    /// Fills are applied in place. Violations are returned, not raised; an
    /// unknown rule tag aborts the pass with [`Error::UnknownRule`].
    pub fn validate<T: Walk + Any>(&self, target: &mut T) -> Result<ValidationErrors> {
        let mut visitor = RuleVisitor {
            rules: &self.field_rules,
            struct_rules: &self.struct_rules,
            path: Vec::new(),
            errors: ValidationErrors::new(),
            fatal: None,
        };
        target.walk(&mut visitor);
        if let Some(err) = visitor.fatal {
            return Err(err);
        }

        visitor.apply_struct_rules(&*target);
        Ok(visitor.errors)
    }
}

struct RuleVisitor<'r> {
    rules: &'r HashMap<String, Box<dyn FieldRule>>,
    struct_rules: &'r [TypedStructRule],
    path: Vec<&'static str>,
    errors: ValidationErrors,
    fatal: Option<Error>,
}

impl RuleVisitor<'_> {
    fn field_path(&self) -> String {
        self.path.join(".")
    }

    /// Apply the field's rules left to right. Returns `false` when
    /// `omitempty` cut the field short.
    fn apply(&mut self, meta: &FieldMeta, value: &mut dyn ConfigValue) -> bool {
        let rules = self.rules;
        for spec in parse_rules(meta.rules) {
            if spec.tag == OMIT_EMPTY {
                if value.is_zero() {
                    return false;
                }
                continue;
            }

            let Some(rule) = rules.get(spec.tag) else {
                self.fatal = Some(Error::UnknownRule {
                    field: self.field_path(),
                    tag: spec.tag.to_string(),
                });
                return false;
            };

            if let Err(e) = rule.fill(value, spec.param) {
                let field = self.field_path();
                tracing::error!(field = %field, rule = spec.tag, error = %e, "Rule failed to fill field");
                self.errors
                    .push(ValidationError::new(field, spec.tag, e.to_string()));
                continue;
            }

            if !rule.check(value, spec.param) {
                let field = self.field_path();
                tracing::debug!(field = %field, rule = spec.tag, "Field rule failed");
                self.errors
                    .push(ValidationError::new(field, spec.tag, rule.message(spec.param)));
            }
        }
        true
    }

    /// Run the struct rules registered for `target`'s type, rooting their
    /// violations at the current path.
    fn apply_struct_rules(&mut self, target: &dyn Any) {
        let rules = self.struct_rules;
        let parent = self.field_path();
        for rule in rules.iter().filter(|rule| rule.applies_to(target)) {
            let violations = rule.validate(target);
            if !violations.is_empty() {
                tracing::debug!(rule = rule.name(), field = %parent, count = violations.len(), "Struct rule failed");
            }
            self.errors
                .extend(violations.into_iter().map(|error| error.within(&parent)));
        }
    }
}

impl FieldVisitor for RuleVisitor<'_> {
    fn visit(&mut self, meta: &FieldMeta, value: &mut dyn ConfigValue) {
        if self.fatal.is_some() {
            return;
        }

        self.path.push(meta.key);
        if self.apply(meta, value) && self.fatal.is_none() {
            if let Some(nested) = value.as_walk_mut() {
                nested.walk(self);
            }
            if self.fatal.is_none() {
                if let Some(target) = value.as_any() {
                    self.apply_struct_rules(target);
                }
            }
        }
        self.path.pop();
    }
}
