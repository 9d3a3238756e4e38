//! Rule contracts and closure adapters

use super::ValidationError;
use crate::error::RuleError;
use crate::value::ConfigValue;
use std::any::{Any, TypeId};

/// One `tag[=param]` segment of a field's rule string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec<'a> {
    pub tag: &'a str,
    pub param: Option<&'a str>,
}

/// Split a rule string such as `required,oneof=a b,default=1` into its segments.
///
/// Empty segments are ignored; only the first `=` separates tag from parameter.
pub fn parse_rules(rules: &str) -> Vec<RuleSpec<'_>> {
    rules
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((tag, param)) => RuleSpec {
                tag: tag.trim(),
                param: Some(param),
            },
            None => RuleSpec {
                tag: segment,
                param: None,
            },
        })
        .collect()
}

/// A rule applied to a single field, selected by tag.
///
/// Rules run in two phases: `fill` may write the field (defaults, fallbacks),
/// then `check` decides whether the field is valid. A failing `fill` counts
/// as a violation and skips `check`.
pub trait FieldRule {
    /// Tag naming this rule in rule strings. Unique within a registry.
    fn tag(&self) -> &str;

    fn fill(&self, value: &mut dyn ConfigValue, param: Option<&str>) -> Result<(), RuleError> {
        let _ = (value, param);
        Ok(())
    }

    fn check(&self, value: &dyn ConfigValue, param: Option<&str>) -> bool;

    /// Message recorded when `check` fails.
    fn message(&self, param: Option<&str>) -> String {
        match param {
            Some(param) => format!("failed on the '{}={}' rule", self.tag(), param),
            None => format!("failed on the '{}' rule", self.tag()),
        }
    }
}

/// A rule applied to a whole populated configuration struct of type `T`,
/// wherever `T` appears in the tree being validated.
pub trait StructRule<T> {
    fn name(&self) -> &str;

    fn validate(&self, target: &T) -> Vec<ValidationError>;
}

type FieldCheck = dyn Fn(&dyn ConfigValue, Option<&str>) -> bool;

/// Field rule built from a closure.
///
/// ```
/// use layerconf::{ConfigValue, FieldValidation};
///
/// let min_size = FieldValidation::new("size", |value: &dyn ConfigValue, _param: Option<&str>| {
///     value.numeric().is_some_and(|size| size >= 10.0)
/// });
/// ```
pub struct FieldValidation {
    tag: String,
    check: Box<FieldCheck>,
}

impl FieldValidation {
    pub fn new(
        tag: impl Into<String>,
        check: impl Fn(&dyn ConfigValue, Option<&str>) -> bool + 'static,
    ) -> Self {
        Self {
            tag: tag.into(),
            check: Box::new(check),
        }
    }
}

impl FieldRule for FieldValidation {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn check(&self, value: &dyn ConfigValue, param: Option<&str>) -> bool {
        (self.check)(value, param)
    }
}

/// Struct rule built from a closure.
pub struct StructValidation<T> {
    name: String,
    validate: Box<dyn Fn(&T) -> Vec<ValidationError>>,
}

impl<T> StructValidation<T> {
    pub fn new(
        name: impl Into<String>,
        validate: impl Fn(&T) -> Vec<ValidationError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            validate: Box::new(validate),
        }
    }
}

impl<T> StructRule<T> for StructValidation<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, target: &T) -> Vec<ValidationError> {
        (self.validate)(target)
    }
}

type ErasedStructCheck = dyn Fn(&dyn Any) -> Vec<ValidationError>;

/// A [`StructRule`] bound to the concrete type it validates.
///
/// Violations carry field paths relative to the validated struct; the
/// registry re-roots them under the struct's own path.
pub struct TypedStructRule {
    target: TypeId,
    target_name: &'static str,
    name: String,
    validate: Box<ErasedStructCheck>,
}

impl TypedStructRule {
    pub fn new<T: 'static>(rule: impl StructRule<T> + 'static) -> Self {
        let name = rule.name().to_string();
        Self {
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            name,
            validate: Box::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
                Some(target) => rule.validate(target),
                None => Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the struct this rule validates.
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub fn applies_to(&self, value: &dyn Any) -> bool {
        Any::type_id(value) == self.target
    }

    /// Run the rule; values of any other type yield no violations.
    pub fn validate(&self, value: &dyn Any) -> Vec<ValidationError> {
        (self.validate)(value)
    }
}

/// A caller-supplied rule for one resolution call.
pub enum Rule {
    Field(Box<dyn FieldRule>),
    Struct(TypedStructRule),
}

impl Rule {
    pub fn field(rule: impl FieldRule + 'static) -> Self {
        Self::Field(Box::new(rule))
    }

    pub fn structure<T: 'static>(rule: impl StructRule<T> + 'static) -> Self {
        Self::Struct(TypedStructRule::new(rule))
    }

    /// Tag or name identifying the rule.
    pub fn name(&self) -> &str {
        match self {
            Self::Field(rule) => rule.tag(),
            Self::Struct(rule) => rule.name(),
        }
    }
}

impl From<FieldValidation> for Rule {
    fn from(rule: FieldValidation) -> Self {
        Self::Field(Box::new(rule))
    }
}

impl<T: 'static> From<StructValidation<T>> for Rule {
    fn from(rule: StructValidation<T>) -> Self {
        Self::structure(rule)
    }
}
