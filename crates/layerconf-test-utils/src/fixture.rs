//! In-memory configuration fixtures.

use layerconf::MemorySource;
use std::collections::HashMap;

/// Builder for a [`MemorySource`] keyed by namespace and key.
///
/// # Example
///
/// ```rust
/// use layerconf::SourceReader;
/// use layerconf_test_utils::ConfigFixture;
///
/// let source = ConfigFixture::new("project")
///     .set("org_id", "123")
///     .set_in("esc", "region", "us-west-1")
///     .build();
/// assert!(source.lookup("project", "org_id").unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFixture {
    namespace: String,
    source: MemorySource,
}

impl ConfigFixture {
    /// Start a fixture whose [`set`](Self::set) calls land in `namespace`.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            source: MemorySource::new(),
        }
    }

    /// Store `raw` under the fixture's namespace.
    pub fn set(self, key: &str, raw: &str) -> Self {
        let namespace = self.namespace.clone();
        self.set_in(&namespace, key, raw)
    }

    /// Store `raw` under an explicit namespace.
    pub fn set_in(mut self, namespace: &str, key: &str, raw: &str) -> Self {
        self.source.insert(namespace, key, raw);
        self
    }

    pub fn build(self) -> MemorySource {
        self.source
    }
}

/// Environment map for `ConfigResolver::with_environment`.
pub fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
