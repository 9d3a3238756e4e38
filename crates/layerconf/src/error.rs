//! Error types for layerconf

use crate::validate::ValidationErrors;
use crate::value::ValueKind;
use std::path::PathBuf;

/// Result type for layerconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by a resolution call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value was found but could not be decoded into the destination shape
    #[error("error while decoding '{namespace}:{key}': {message}")]
    SourceDecode {
        namespace: String,
        key: String,
        message: String,
    },

    /// A value was requested with `read` but is absent
    #[error("configuration '{namespace}:{key}' not found")]
    NotFound { namespace: String, key: String },

    /// Neither the primary nor the override namespace satisfied a required field
    #[error("error while reading required config '{key}' from namespace '{namespace}': {reason}")]
    RequiredFieldMissing {
        key: String,
        namespace: String,
        reason: String,
    },

    /// A field carries a rule tag nobody registered
    #[error("undefined validation rule '{tag}' on field '{field}'")]
    UnknownRule { field: String, tag: String },

    /// Aggregated field and struct rule violations
    #[error("validation error: {0}")]
    ValidationFailed(ValidationErrors),

    /// Structural merge contract violation
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Failure inside a source backend
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl Error {
    /// Violations carried by a `ValidationFailed` error.
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Structural merge failures. These indicate a programming error in the
/// shape of the configuration types, not bad data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Operands hold values of incompatible kinds
    #[error("cannot merge {found} into {expected} at '{path}'")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The destination field refuses writes
    #[error("field '{path}' is not assignable")]
    FieldNotAssignable { path: String },
}

impl MergeError {
    /// Prefix the error path with the enclosing field.
    pub fn within(self, segment: &str) -> Self {
        let join = |path: String| {
            if path.is_empty() {
                segment.to_string()
            } else {
                format!("{segment}.{path}")
            }
        };
        match self {
            Self::TypeMismatch {
                path,
                expected,
                found,
            } => Self::TypeMismatch {
                path: join(path),
                expected,
                found,
            },
            Self::FieldNotAssignable { path } => Self::FieldNotAssignable { path: join(path) },
        }
    }

    /// Dotted path of the offending field.
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. } | Self::FieldNotAssignable { path } => path,
        }
    }
}

/// Errors raised by source backends
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} source {path}: {message}")]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("unsupported source format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("source backend error: {0}")]
    Backend(String),
}

/// Failure to write a raw string into a typed field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("cannot parse '{value}' as {kind}: {reason}")]
    Parse {
        value: String,
        kind: ValueKind,
        reason: String,
    },

    #[error("{kind} fields cannot be assigned from a string")]
    Unsupported { kind: ValueKind },
}

impl AssignError {
    pub(crate) fn parse(value: &str, kind: ValueKind, reason: impl ToString) -> Self {
        Self::Parse {
            value: value.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Failure of a field rule's fill phase
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error("{0}")]
    Message(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_error_within_builds_dotted_path() {
        let err = MergeError::FieldNotAssignable {
            path: "region".into(),
        }
        .within("digital_ocean")
        .within("stack");
        assert_eq!(err.path(), "stack.digital_ocean.region");
    }

    #[test]
    fn merge_error_within_empty_path_uses_segment() {
        let err = MergeError::TypeMismatch {
            path: String::new(),
            expected: "object",
            found: "string",
        }
        .within("labels");
        assert_eq!(err.path(), "labels");
        assert_eq!(
            err.to_string(),
            "cannot merge string into object at 'labels'"
        );
    }

    #[test]
    fn required_field_missing_names_key() {
        let err = Error::RequiredFieldMissing {
            key: "digital_ocean".into(),
            namespace: "project".into(),
            reason: "not found".into(),
        };
        let display = err.to_string();
        assert!(display.contains("digital_ocean"), "got: {display}");
        assert!(display.contains("project"), "got: {display}");
    }
}
