//! Layerconf: typed, namespaced configuration resolution
//!
//! A configuration struct derives [`Config`]; each keyed field is read from
//! a namespaced [`SourceReader`], merged with an optional override namespace,
//! then filled and validated by a rule pipeline.
//!
//! ```
//! use layerconf::{Config, ConfigResolver, MemorySource};
//! use serde::Deserialize;
//! use std::collections::HashMap;
//!
//! #[derive(Debug, Clone, Default, Deserialize, Config)]
//! #[serde(default)]
//! struct DigitalOcean {
//!     #[config(key = "region", validate = "required,oneof=us-east-1 us-west-1")]
//!     region: String,
//! }
//!
//! #[derive(Debug, Clone, Default, Deserialize, Config)]
//! struct Stack {
//!     #[config(key = "digital_ocean", override_namespace = "esc", validate = "required")]
//!     digital_ocean: DigitalOcean,
//! }
//!
//! let source = MemorySource::new()
//!     .with("project:digital_ocean", r#"{"region":"us-east-1"}"#)
//!     .with("esc:digital_ocean", r#"{"region":"us-west-1"}"#);
//!
//! let stack: Stack = ConfigResolver::new(&source, "project")
//!     .with_environment(HashMap::<String, String>::new())
//!     .resolve(Vec::new())
//!     .unwrap();
//! assert_eq!(stack.digital_ocean.region, "us-west-1");
//! ```

// Lets `#[derive(Config)]` output, which names `::layerconf`, compile inside this crate.
extern crate self as layerconf;

pub mod env;
pub mod error;
pub mod logging;
pub mod merge;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod validate;
pub mod value;

pub use layerconf_derive::Config;

pub use env::{Environment, ProcessEnvironment};
pub use error::{AssignError, Error, MergeError, Result, RuleError, SourceError};
pub use merge::Merge;
pub use resolver::{ConfigResolver, DECODE_RULE, FieldResolver, resolve};
pub use schema::{FieldDescriptor, FieldMeta, FieldVisitor, Schema, Walk};
pub use source::{FileSource, Format, LayeredSource, MemorySource, SourceReader, read, try_read};
pub use validate::{
    FieldRule, FieldValidation, Rule, RuleRegistry, RuleSpec, StructRule, StructValidation,
    TypedStructRule, ValidationError, ValidationErrors, parse_rules,
};
pub use value::{ConfigValue, IsZero, ValueKind, parse_bool};
