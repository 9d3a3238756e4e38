//! Tracing subscriber setup for programs and test suites using the resolver
//!
//! Resolution logs per-field reads and merges at `debug`, dropped or
//! undecodable values at `warn`, and failed fills at `error`.

use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Directive used by [`init_for_tests`] when `RUST_LOG` is unset.
pub const TEST_DIRECTIVE: &str = "layerconf=debug";

/// Build a filter from `RUST_LOG`, falling back to `default_directive`.
pub fn filter(default_directive: &str) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?)
}

/// Install a compact stdout subscriber as the global default.
///
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter(DEFAULT_DIRECTIVE)?)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Route resolver events into the test harness's captured output.
///
/// Safe to call from every test; only the first call in a process installs
/// a subscriber. Returns whether this process now has one from this module.
pub fn init_for_tests() -> bool {
    static INSTALLED: OnceLock<bool> = OnceLock::new();

    *INSTALLED.get_or_init(|| {
        let installed = filter(TEST_DIRECTIVE).and_then(|filter| {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_test_writer().compact())
                .try_init()
                .map_err(Into::into)
        });
        installed.is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, warn};

    #[test]
    fn test_init_is_idempotent() {
        let first = init_for_tests();
        let second = init_for_tests();
        assert_eq!(first, second);

        debug!(key = "org_id", "Read configuration value");
        warn!(key = "org_id", "Discarded undecodable value");
    }

    #[test]
    fn init_fails_once_a_subscriber_is_installed() {
        init_for_tests();
        assert!(init().is_err());
    }

    #[test]
    fn default_directives_parse() {
        assert!(filter(DEFAULT_DIRECTIVE).is_ok());
        assert!(filter(TEST_DIRECTIVE).is_ok());
    }
}
