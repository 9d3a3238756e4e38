//! Rules every registry knows about

use super::rule::FieldRule;
use crate::env::Environment;
use crate::error::RuleError;
use crate::value::{ConfigValue, ValueKind};
use std::sync::Arc;

pub const REQUIRED: &str = "required";
pub const OMIT_EMPTY: &str = "omitempty";
pub const ONE_OF: &str = "oneof";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const DEFAULT: &str = "default";
pub const ENV: &str = "env";

/// `required`: the field must not be zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl FieldRule for Required {
    fn tag(&self) -> &str {
        REQUIRED
    }

    fn check(&self, value: &dyn ConfigValue, _param: Option<&str>) -> bool {
        !value.is_zero()
    }

    fn message(&self, _param: Option<&str>) -> String {
        "is required".to_string()
    }
}

/// `oneof=a b c`: the rendered value must be one of the space separated options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneOf;

impl FieldRule for OneOf {
    fn tag(&self) -> &str {
        ONE_OF
    }

    fn check(&self, value: &dyn ConfigValue, param: Option<&str>) -> bool {
        let Some(rendered) = value.render() else {
            return false;
        };
        param
            .unwrap_or_default()
            .split_whitespace()
            .any(|option| option == rendered)
    }

    fn message(&self, param: Option<&str>) -> String {
        format!("must be one of [{}]", param.unwrap_or_default())
    }
}

/// What `min`/`max` compare: length for strings and collections, the value for numbers.
fn measure(value: &dyn ConfigValue) -> Option<f64> {
    match value.kind() {
        ValueKind::Str | ValueKind::List | ValueKind::Map => value.length().map(|n| n as f64),
        ValueKind::Int | ValueKind::Uint | ValueKind::Float => value.numeric(),
        ValueKind::Dynamic => value
            .numeric()
            .or_else(|| value.length().map(|n| n as f64)),
        ValueKind::Bool | ValueKind::Struct => None,
    }
}

fn bound(tag: &str, param: Option<&str>) -> Option<f64> {
    let raw = param.unwrap_or_default();
    match raw.trim().parse::<f64>() {
        Ok(limit) => Some(limit),
        Err(e) => {
            tracing::error!(rule = tag, param = raw, error = %e, "Invalid rule parameter");
            None
        }
    }
}

/// `min=N`: length or value must be at least `N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl FieldRule for Min {
    fn tag(&self) -> &str {
        MIN
    }

    fn check(&self, value: &dyn ConfigValue, param: Option<&str>) -> bool {
        match (measure(value), bound(MIN, param)) {
            (Some(actual), Some(limit)) => actual >= limit,
            _ => false,
        }
    }

    fn message(&self, param: Option<&str>) -> String {
        format!("must be at least {}", param.unwrap_or_default())
    }
}

/// `max=N`: length or value must be at most `N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl FieldRule for Max {
    fn tag(&self) -> &str {
        MAX
    }

    fn check(&self, value: &dyn ConfigValue, param: Option<&str>) -> bool {
        match (measure(value), bound(MAX, param)) {
            (Some(actual), Some(limit)) => actual <= limit,
            _ => false,
        }
    }

    fn message(&self, param: Option<&str>) -> String {
        format!("must be at most {}", param.unwrap_or_default())
    }
}

/// `default=LITERAL`: assign the literal to a zero string or numeric field.
///
/// Other kinds are left alone. A literal that does not parse as the field's
/// numeric type fails the rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValue;

impl FieldRule for DefaultValue {
    fn tag(&self) -> &str {
        DEFAULT
    }

    fn fill(&self, value: &mut dyn ConfigValue, param: Option<&str>) -> Result<(), RuleError> {
        let literal = param.unwrap_or_default();
        if literal.is_empty() || !value.is_zero() || !value.kind().accepts_default() {
            return Ok(());
        }
        value.assign_str(literal)?;
        Ok(())
    }

    fn check(&self, _value: &dyn ConfigValue, _param: Option<&str>) -> bool {
        true
    }
}

/// `env=VAR`: fill a still-zero scalar field from an environment variable.
///
/// Absent, empty or unparsable variables leave the field untouched; the rule
/// never fails.
pub struct EnvFallback {
    environment: Arc<dyn Environment>,
}

impl EnvFallback {
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self { environment }
    }
}

impl FieldRule for EnvFallback {
    fn tag(&self) -> &str {
        ENV
    }

    fn fill(&self, value: &mut dyn ConfigValue, param: Option<&str>) -> Result<(), RuleError> {
        let name = param.unwrap_or_default();
        if name.is_empty() || !value.is_zero() || !value.kind().is_scalar() {
            return Ok(());
        }
        let Some(raw) = self.environment.var(name).filter(|raw| !raw.is_empty()) else {
            return Ok(());
        };
        match value.assign_str(&raw) {
            Ok(()) => tracing::debug!(variable = name, "Field filled from environment"),
            Err(e) => tracing::debug!(variable = name, error = %e, "Ignoring unparsable environment value"),
        }
        Ok(())
    }

    fn check(&self, _value: &dyn ConfigValue, _param: Option<&str>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssignError;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> Arc<dyn Environment> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(map)
    }

    #[test]
    fn required_rejects_zero_values() {
        assert!(!Required.check(&String::new(), None));
        assert!(!Required.check(&0u32, None));
        assert!(!Required.check(&None::<String>, None));
        assert!(Required.check(&"x".to_string(), None));
    }

    #[rstest]
    #[case("us-east-1", true)]
    #[case("us-west-1", true)]
    #[case("invalid-region", false)]
    #[case("", false)]
    fn oneof_matches_listed_options(#[case] region: &str, #[case] valid: bool) {
        let value = region.to_string();
        assert_eq!(
            OneOf.check(&value, Some("us-east-1 us-west-1 eu-west-1")),
            valid
        );
    }

    #[test]
    fn oneof_renders_numbers() {
        assert!(OneOf.check(&3u8, Some("1 2 3")));
        assert!(!OneOf.check(&vec![1u8], Some("1")));
    }

    #[rstest]
    #[case(MIN, "3", "abc", true)]
    #[case(MIN, "4", "abc", false)]
    #[case(MAX, "3", "abc", true)]
    #[case(MAX, "2", "abc", false)]
    fn min_max_measure_string_length(
        #[case] tag: &str,
        #[case] param: &str,
        #[case] text: &str,
        #[case] valid: bool,
    ) {
        let value = text.to_string();
        let rule: &dyn FieldRule = if tag == MIN { &Min } else { &Max };
        assert_eq!(rule.check(&value, Some(param)), valid);
    }

    #[test]
    fn min_max_compare_numbers_and_reject_bad_params() {
        assert!(Min.check(&10i64, Some("10")));
        assert!(!Min.check(&9i64, Some("10")));
        assert!(Max.check(&2.5f64, Some("3")));
        assert!(!Max.check(&2.5f64, Some("abc")));
        assert!(!Min.check(&true, Some("0")));
    }

    #[test]
    fn default_fills_only_zero_values() {
        let mut count = 0i64;
        DefaultValue.fill(&mut count, Some("100")).unwrap();
        assert_eq!(count, 100);

        let mut set = 7i64;
        DefaultValue.fill(&mut set, Some("100")).unwrap();
        assert_eq!(set, 7);

        let mut name = String::new();
        DefaultValue.fill(&mut name, Some("DefaultValue")).unwrap();
        assert_eq!(name, "DefaultValue");
    }

    #[test]
    fn default_ignores_booleans_and_collections() {
        let mut flag = false;
        DefaultValue.fill(&mut flag, Some("true")).unwrap();
        assert!(!flag);

        let mut items: Vec<String> = Vec::new();
        DefaultValue.fill(&mut items, Some("a")).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn default_with_unparsable_numeric_literal_fails() {
        let mut count = 0u32;
        let err = DefaultValue.fill(&mut count, Some("lots")).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Assign(AssignError::Parse {
                kind: ValueKind::Uint,
                ..
            })
        ));
        assert_eq!(count, 0);
    }

    #[test]
    fn env_fills_zero_scalars() {
        let rule = EnvFallback::new(env(&[
            ("MY_NAME", "bob"),
            ("MY_PORT", "8080"),
            ("MY_FLAG", "true"),
        ]));

        let mut name = String::new();
        rule.fill(&mut name, Some("MY_NAME")).unwrap();
        assert_eq!(name, "bob");

        let mut port = 0u16;
        rule.fill(&mut port, Some("MY_PORT")).unwrap();
        assert_eq!(port, 8080);

        let mut flag = false;
        rule.fill(&mut flag, Some("MY_FLAG")).unwrap();
        assert!(flag);
    }

    #[test]
    fn env_never_overwrites_and_never_fails() {
        let rule = EnvFallback::new(env(&[("MY_NAME", "bob"), ("MY_PORT", "not-a-port"), ("EMPTY", "")]));

        let mut name = "alice".to_string();
        rule.fill(&mut name, Some("MY_NAME")).unwrap();
        assert_eq!(name, "alice");

        let mut port = 0u16;
        rule.fill(&mut port, Some("MY_PORT")).unwrap();
        assert_eq!(port, 0);

        let mut empty = String::new();
        rule.fill(&mut empty, Some("EMPTY")).unwrap();
        rule.fill(&mut empty, Some("MISSING")).unwrap();
        assert_eq!(empty, "");
        assert!(rule.check(&empty, Some("MISSING")));
    }
}
