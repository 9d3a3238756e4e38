//! [`ConfigDir`] for file-backed source scenarios.

use layerconf::FileSource;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding configuration documents.
///
/// # Example
///
/// ```rust
/// use layerconf::SourceReader;
/// use layerconf_test_utils::ConfigDir;
///
/// let dir = ConfigDir::new();
/// let source = dir.source("stack.toml", "[project]\norg_id = 1\n");
/// assert!(source.lookup("project", "org_id").unwrap().is_some());
/// ```
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    /// Create an empty temporary directory.
    ///
    /// # Panics
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("ConfigDir::new: failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` (relative to the root) and return its path.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("ConfigDir::write: failed to create {}: {e}", parent.display())
            });
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("ConfigDir::write: failed to write {}: {e}", path.display()));
        path
    }

    /// Write a document and load it as a [`FileSource`].
    ///
    /// # Panics
    /// Panics if the document cannot be written or parsed.
    pub fn source(&self, name: &str, content: &str) -> FileSource {
        let path = self.write(name, content);
        FileSource::load(&path)
            .unwrap_or_else(|e| panic!("ConfigDir::source: failed to load {}: {e}", path.display()))
    }
}
