//! Configuration resolution
//!
//! Resolution runs in two stages. First every configuration field is read
//! from its primary namespace and, when it has one, merged with the value
//! found in its override namespace. Then the rule pipeline fills defaults
//! and environment fallbacks and validates the populated struct.
//!
//! Precedence, highest first: override namespace, primary namespace,
//! `default` rule, `env` rule.

use crate::env::{Environment, ProcessEnvironment};
use crate::error::{Error, Result};
use crate::merge::Merge;
use crate::schema::{FieldDescriptor, Schema};
use crate::source::{SourceReader, try_read};
use crate::validate::{Rule, RuleRegistry, ValidationError, ValidationErrors};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Rule tag recorded for optional fields whose stored value failed to decode.
pub const DECODE_RULE: &str = "decode";

/// Outcome of reading one namespace.
enum Read {
    Found,
    Absent,
    Failed(Error),
}

impl Read {
    fn found(&self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Per-field reader handed to [`Schema::resolve_fields`].
///
/// Required fields fail fast. Decode failures on optional fields are kept and
/// reported together with the validation violations, even when the other
/// namespace supplied a value. A required field only drops a decode failure
/// when the other namespace satisfied it.
pub struct FieldResolver<'a> {
    source: &'a dyn SourceReader,
    default_namespace: &'a str,
    faults: ValidationErrors,
}

impl<'a> FieldResolver<'a> {
    pub fn new(source: &'a dyn SourceReader, default_namespace: &'a str) -> Self {
        Self {
            source,
            default_namespace,
            faults: ValidationErrors::new(),
        }
    }

    /// Read `field` from its primary namespace, then merge the override
    /// namespace value on top.
    pub fn resolve<F>(&mut self, descriptor: &FieldDescriptor, field: &mut F) -> Result<()>
    where
        F: DeserializeOwned + Merge + Clone,
    {
        let key = descriptor.key();
        let namespace = descriptor.namespace().unwrap_or(self.default_namespace);

        let primary = self.read(namespace, key, field);
        let overlay = match descriptor.override_namespace() {
            Some(override_namespace) => {
                let mut scratch = field.clone();
                match self.read(override_namespace, key, &mut scratch) {
                    Read::Found => {
                        *field = field.merge(&scratch)?;
                        tracing::debug!(key, namespace = override_namespace, "Merged override value");
                        Some((override_namespace, Read::Found))
                    }
                    other => Some((override_namespace, other)),
                }
            }
            None => None,
        };

        let satisfied = primary.found() || overlay.as_ref().is_some_and(|(_, read)| read.found());

        if descriptor.is_required() && !satisfied {
            let mut reasons = vec![describe(namespace, primary)];
            if let Some((override_namespace, read)) = overlay {
                reasons.push(describe(override_namespace, read));
            }
            return Err(Error::RequiredFieldMissing {
                key: key.to_string(),
                namespace: namespace.to_string(),
                reason: reasons.join("; "),
            });
        }

        let reads = std::iter::once((namespace, primary)).chain(overlay);
        for (source_namespace, read) in reads {
            let Read::Failed(err) = read else {
                continue;
            };
            if descriptor.is_required() {
                tracing::warn!(key, namespace = source_namespace, error = %err, "Discarded undecodable value");
            } else {
                tracing::warn!(key, namespace = source_namespace, error = %err, "Optional field failed to decode");
                self.faults
                    .push(ValidationError::new(key, DECODE_RULE, err.to_string()));
            }
        }
        Ok(())
    }

    fn read<F: DeserializeOwned>(&self, namespace: &str, key: &str, field: &mut F) -> Read {
        match try_read(self.source, namespace, key, field) {
            Ok(true) => {
                tracing::debug!(key, namespace, "Read configuration value");
                Read::Found
            }
            Ok(false) => Read::Absent,
            Err(err) => Read::Failed(err),
        }
    }

    /// Decode faults collected on optional fields.
    pub fn into_faults(self) -> ValidationErrors {
        self.faults
    }
}

fn describe(namespace: &str, read: Read) -> String {
    match read {
        Read::Found => format!("found in '{namespace}'"),
        Read::Absent => format!("not found in '{namespace}'"),
        Read::Failed(err) => err.to_string(),
    }
}

/// Resolves configuration structs from one source.
///
/// ```
/// use layerconf::{Config, ConfigResolver, MemorySource};
/// use serde::Deserialize;
/// use std::collections::HashMap;
///
/// #[derive(Debug, Clone, Default, Deserialize, Config)]
/// struct Project {
///     #[config(key = "org_id", validate = "default=100")]
///     org_id: i64,
/// }
///
/// let source = MemorySource::new();
/// let resolver = ConfigResolver::new(&source, "project")
///     .with_environment(HashMap::<String, String>::new());
/// let project: Project = resolver.resolve(Vec::new()).unwrap();
/// assert_eq!(project.org_id, 100);
/// ```
pub struct ConfigResolver<'a> {
    source: &'a dyn SourceReader,
    default_namespace: String,
    environment: Arc<dyn Environment>,
}

impl<'a> ConfigResolver<'a> {
    /// Resolver reading fields without an explicit namespace from `default_namespace`.
    pub fn new(source: &'a dyn SourceReader, default_namespace: impl Into<String>) -> Self {
        Self {
            source,
            default_namespace: default_namespace.into(),
            environment: Arc::new(ProcessEnvironment),
        }
    }

    /// Use `environment` for the `env` rule instead of the process environment.
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Populate and validate `target` in place.
    ///
    /// Caller rules run before the `default` and `env` built-ins; a caller
    /// rule may replace a standard rule with the same tag. On a validation
    /// failure `target` keeps the values resolution produced.
    ///
    /// Struct rules fire for every value of their target type, root or nested.
    pub fn resolve_into<T: Schema + 'static>(&self, target: &mut T, rules: Vec<Rule>) -> Result<()> {
        let _span = tracing::debug_span!("resolve", namespace = %self.default_namespace).entered();

        let mut fields = FieldResolver::new(self.source, &self.default_namespace);
        target.resolve_fields(&mut fields)?;
        let mut errors = fields.into_faults();

        let mut registry = RuleRegistry::with_standard();
        for rule in rules {
            registry.register(rule);
        }
        registry.register_builtins(Arc::clone(&self.environment));
        errors.extend(registry.validate(target)?);

        if errors.is_empty() {
            tracing::debug!(fields = T::descriptors().len(), "Configuration resolved");
            Ok(())
        } else {
            Err(Error::ValidationFailed(errors))
        }
    }

    /// Populate and validate a fresh `T`.
    pub fn resolve<T: Schema + Default + 'static>(&self, rules: Vec<Rule>) -> Result<T> {
        let mut target = T::default();
        self.resolve_into(&mut target, rules)?;
        Ok(target)
    }
}

/// Populate and validate `target` through `resolver`.
pub fn resolve<T: Schema + 'static>(
    resolver: &ConfigResolver<'_>,
    target: &mut T,
    rules: Vec<Rule>,
) -> Result<()> {
    resolver.resolve_into(target, rules)
}
