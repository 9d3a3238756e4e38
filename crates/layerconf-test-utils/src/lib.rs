//! Shared test utilities for the layerconf workspace.
//!
//! Dev-dependency only, never published. Only integration tests (`tests/`)
//! may use it; unit tests inside `layerconf` would see a second copy of the
//! crate's types.
//!
//! # Modules
//!
//! - [`fixture`]: in-memory [`ConfigFixture`] sources and environment maps
//! - [`dir`]: [`ConfigDir`] for file-backed sources in a temporary directory

pub mod dir;
pub mod fixture;

pub use dir::ConfigDir;
pub use fixture::{ConfigFixture, env_map};
