//! Field value views
//!
//! Validation rules never see concrete field types. They operate on a
//! [`ConfigValue`] view that exposes the zero check, a string rendering for
//! scalars, and string assignment for fills (`default`, `env`).

use crate::error::AssignError;
use crate::schema::Walk;
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Whether a value equals the zero value of its type.
///
/// Zero means: empty string, numeric zero, `false`, `None`, empty
/// collection, JSON `null`, or a struct whose fields are all zero.
pub trait IsZero {
    fn is_zero(&self) -> bool;
}

/// Coarse shape of a field, used by rules to decide how to treat it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Str,
    Int,
    Uint,
    Float,
    Bool,
    List,
    Map,
    Struct,
    Dynamic,
}

impl ValueKind {
    /// Scalar kinds can be parsed from a flat string.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Str | Self::Int | Self::Uint | Self::Float | Self::Bool
        )
    }

    /// Kinds a `default` literal applies to.
    pub fn accepts_default(self) -> bool {
        matches!(self, Self::Str | Self::Int | Self::Uint | Self::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Uint => "unsigned integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::List => "list",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Dynamic => "dynamic value",
        };
        f.write_str(name)
    }
}

/// Object-safe view of a configuration field.
pub trait ConfigValue: IsZero {
    fn kind(&self) -> ValueKind;

    /// String form of scalar values, used by `oneof` and error messages.
    fn render(&self) -> Option<String> {
        None
    }

    /// Numeric value, used by `min`/`max`.
    fn numeric(&self) -> Option<f64> {
        None
    }

    /// Element or character count, used by `min`/`max` on strings and collections.
    fn length(&self) -> Option<usize> {
        None
    }

    /// Parse `raw` and store it in place.
    fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
        let _ = raw;
        Err(AssignError::Unsupported { kind: self.kind() })
    }

    /// Nested configuration struct, if this value is one.
    fn as_walk_mut(&mut self) -> Option<&mut dyn Walk> {
        None
    }

    /// Concrete value of a nested configuration struct, for rules keyed by type.
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Parse a boolean the way environment variables usually spell them.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

macro_rules! numeric_value {
    ($kind:expr => $($t:ty),*) => {$(
        impl IsZero for $t {
            fn is_zero(&self) -> bool {
                *self == (0 as $t)
            }
        }

        impl ConfigValue for $t {
            fn kind(&self) -> ValueKind {
                $kind
            }

            fn render(&self) -> Option<String> {
                Some(self.to_string())
            }

            fn numeric(&self) -> Option<f64> {
                Some(*self as f64)
            }

            fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
                *self = raw
                    .trim()
                    .parse::<$t>()
                    .map_err(|e| AssignError::parse(raw, $kind, e))?;
                Ok(())
            }
        }
    )*};
}

numeric_value!(ValueKind::Int => i8, i16, i32, i64, isize);
numeric_value!(ValueKind::Uint => u8, u16, u32, u64, usize);
numeric_value!(ValueKind::Float => f32, f64);

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl ConfigValue for bool {
    fn kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
        *self = parse_bool(raw.trim())
            .ok_or_else(|| AssignError::parse(raw, ValueKind::Bool, "invalid syntax"))?;
        Ok(())
    }
}

impl IsZero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ConfigValue for String {
    fn kind(&self) -> ValueKind {
        ValueKind::Str
    }

    fn render(&self) -> Option<String> {
        Some(self.clone())
    }

    fn length(&self) -> Option<usize> {
        Some(self.chars().count())
    }

    fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
        *self = raw.to_string();
        Ok(())
    }
}

impl<T> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: ConfigValue + Default> ConfigValue for Option<T> {
    fn kind(&self) -> ValueKind {
        match self {
            Some(inner) => inner.kind(),
            None => T::default().kind(),
        }
    }

    fn render(&self) -> Option<String> {
        self.as_ref().and_then(|inner| inner.render())
    }

    fn numeric(&self) -> Option<f64> {
        self.as_ref().and_then(|inner| inner.numeric())
    }

    fn length(&self) -> Option<usize> {
        self.as_ref().and_then(|inner| inner.length())
    }

    fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
        let mut inner = T::default();
        inner.assign_str(raw)?;
        *self = Some(inner);
        Ok(())
    }

    fn as_walk_mut(&mut self) -> Option<&mut dyn Walk> {
        self.as_mut().and_then(|inner| inner.as_walk_mut())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        self.as_ref().and_then(|inner| inner.as_any())
    }
}

impl<T> IsZero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> ConfigValue for Vec<T> {
    fn kind(&self) -> ValueKind {
        ValueKind::List
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<K, V, S> IsZero for HashMap<K, V, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> ConfigValue for HashMap<K, V, S> {
    fn kind(&self) -> ValueKind {
        ValueKind::Map
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<K, V> IsZero for BTreeMap<K, V> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> ConfigValue for BTreeMap<K, V> {
    fn kind(&self) -> ValueKind {
        ValueKind::Map
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl IsZero for Value {
    fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }
}

impl ConfigValue for Value {
    fn kind(&self) -> ValueKind {
        ValueKind::Dynamic
    }

    fn render(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<f64> {
        self.as_f64()
    }

    fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// JSON text is stored structurally, anything else as a plain string.
    fn assign_str(&mut self, raw: &str) -> Result<(), AssignError> {
        *self = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("1", Some(true))]
    #[case("TRUE", Some(true))]
    #[case("t", Some(true))]
    #[case("0", Some(false))]
    #[case("False", Some(false))]
    #[case("yes", None)]
    #[case("", None)]
    fn parse_bool_accepts_common_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(raw), expected);
    }

    #[test]
    fn numeric_assign_parses_into_concrete_type() {
        let mut value: u16 = 0;
        value.assign_str("8080").unwrap();
        assert_eq!(value, 8080);

        let err = value.assign_str("70000").unwrap_err();
        assert!(matches!(
            err,
            AssignError::Parse {
                kind: ValueKind::Uint,
                ..
            }
        ));
    }

    #[test]
    fn float_assign_and_render() {
        let mut value: f32 = 0.0;
        value.assign_str("24.24").unwrap();
        assert_eq!(value, 24.24);
        assert!(!value.is_zero());
    }

    #[test]
    fn option_assign_wraps_inner_value() {
        let mut value: Option<i64> = None;
        assert!(value.is_zero());
        assert_eq!(value.kind(), ValueKind::Int);
        value.assign_str("42").unwrap();
        assert_eq!(value, Some(42));
    }

    #[test]
    fn list_assign_is_unsupported() {
        let mut value: Vec<String> = Vec::new();
        assert_eq!(
            value.assign_str("a,b"),
            Err(AssignError::Unsupported {
                kind: ValueKind::List
            })
        );
    }

    #[test]
    fn json_value_zero_and_assign() {
        assert!(json!(null).is_zero());
        assert!(json!("").is_zero());
        assert!(json!(0).is_zero());
        assert!(!json!({"a": 1}).is_zero());

        let mut value = Value::Null;
        value.assign_str(r#"{"enabled":true}"#).unwrap();
        assert_eq!(value, json!({"enabled": true}));
        value.assign_str("plain").unwrap();
        assert_eq!(value, json!("plain"));
    }
}
