//! Derive macro for layered configuration structs.
//!
//! `#[derive(Config)]` generates everything the `layerconf` resolver needs to
//! populate a struct without runtime reflection:
//!
//! - the ordered field descriptors (`Schema::descriptors`)
//! - a typed per-field resolution routine (`Schema::resolve_fields`)
//! - a field-wise structural merge (`Merge`)
//! - a zero-value check (`IsZero`)
//! - a walker that hands every configuration field to the validation pipeline (`Walk`)
//!
//! # Field Attributes
//! - `#[config(key = "digital_ocean")]` - Source key. Fields without a key are not configuration
//! - `#[config(namespace = "provider")]` - Explicit primary namespace
//! - `#[config(override_namespace = "esc")]` - Namespace whose non-zero values win on merge
//! - `#[config(validate = "required,oneof=a b")]` - Rule string for the validation pipeline
//! - `#[config(readonly)]` - Merge refuses to overwrite this field
//! - `#[config(skip)]` - Excluded from merge, zero checks and validation
//!
//! # Example
//! ```ignore
//! #[derive(Debug, Clone, Default, Deserialize, Config)]
//! pub struct StackConfig {
//!     #[config(key = "digital_ocean", override_namespace = "esc", validate = "required")]
//!     pub digital_ocean: DigitalOcean,
//!     #[config(key = "org_id", validate = "default=100")]
//!     pub org_id: i64,
//! }
//! ```

mod config;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derive `Schema`, `Merge`, `IsZero`, `ConfigValue` and `Walk` for a
/// non-generic struct with named fields.
#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config::generate_impl(&input).into()
}
