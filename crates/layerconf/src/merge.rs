//! Structural merge
//!
//! `base.merge(&overlay)` returns a new value where every leaf takes the
//! overlay's value when that value is non-zero, and the base's value
//! otherwise. Nested configuration structs merge field by field (the derive
//! macro generates that part). A present optional leaf is non-zero, so
//! `Some(0)` over `Some(3)` yields `Some(0)`. Neither operand is modified.

use crate::error::MergeError;
use crate::value::IsZero;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Pure, recursive "overlay wins if non-zero" merge.
pub trait Merge: Sized {
    /// Whether two present values merge member by member. Leaves replace.
    const STRUCTURAL: bool = false;

    fn merge(&self, overlay: &Self) -> Result<Self, MergeError>;
}

macro_rules! leaf_merge {
    ($($t:ty),*) => {$(
        impl Merge for $t {
            fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
                Ok(if overlay.is_zero() { self.clone() } else { overlay.clone() })
            }
        }
    )*};
}

leaf_merge!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String
);

impl<T: Merge + Clone> Merge for Option<T> {
    fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
        match (self, overlay) {
            (Some(base), Some(over)) if T::STRUCTURAL => base.merge(over).map(Some),
            (_, Some(over)) => Ok(Some(over.clone())),
            (None, over) => Ok(over.clone()),
            (base, None) => Ok(base.clone()),
        }
    }
}

/// Lists are leaves: a non-empty overlay replaces the base list wholesale.
impl<T: Clone> Merge for Vec<T> {
    fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
        Ok(if overlay.is_empty() {
            self.clone()
        } else {
            overlay.clone()
        })
    }
}

impl<K, V, S> Merge for HashMap<K, V, S>
where
    K: Eq + Hash + Clone + ToString,
    V: Merge + Clone,
    S: BuildHasher + Clone,
{
    const STRUCTURAL: bool = true;

    fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
        let mut merged = self.clone();
        for (key, over) in overlay {
            let value = match self.get(key) {
                Some(base) => base.merge(over).map_err(|e| e.within(&key.to_string()))?,
                None => over.clone(),
            };
            merged.insert(key.clone(), value);
        }
        Ok(merged)
    }
}

impl<K, V> Merge for BTreeMap<K, V>
where
    K: Ord + Clone + ToString,
    V: Merge + Clone,
{
    const STRUCTURAL: bool = true;

    fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
        let mut merged = self.clone();
        for (key, over) in overlay {
            let value = match self.get(key) {
                Some(base) => base.merge(over).map_err(|e| e.within(&key.to_string()))?,
                None => over.clone(),
            };
            merged.insert(key.clone(), value);
        }
        Ok(merged)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Dynamic values merge objects key by key; `null` never overrides and two
/// non-null values of different kinds cannot be reconciled.
impl Merge for Value {
    const STRUCTURAL: bool = true;

    fn merge(&self, overlay: &Self) -> Result<Self, MergeError> {
        match (self, overlay) {
            (base, Value::Null) => Ok(base.clone()),
            (Value::Null, over) => Ok(over.clone()),
            (Value::Object(base), Value::Object(over)) => {
                let mut merged = base.clone();
                for (key, over_value) in over {
                    let value = match base.get(key) {
                        Some(base_value) => {
                            base_value.merge(over_value).map_err(|e| e.within(key))?
                        }
                        None => over_value.clone(),
                    };
                    merged.insert(key.clone(), value);
                }
                Ok(Value::Object(merged))
            }
            (base, over) if json_kind(base) == json_kind(over) => Ok(if over.is_zero() {
                base.clone()
            } else {
                over.clone()
            }),
            (base, over) => Err(MergeError::TypeMismatch {
                path: String::new(),
                expected: json_kind(base),
                found: json_kind(over),
            }),
        }
    }
}
