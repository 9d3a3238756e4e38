//! Configuration sources
//!
//! A [`SourceReader`] looks values up by `(namespace, key)` and hands them
//! back in a self-describing encoding (`serde_json::Value`). Decoding into the
//! destination type happens in [`try_read`] and [`read`], so backends never
//! need to know the target types.

use crate::error::{Error, Result, SourceError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A namespaced key-value store.
pub trait SourceReader {
    /// Value stored at `(namespace, key)`, or `None` if absent.
    fn lookup(&self, namespace: &str, key: &str) -> std::result::Result<Option<Value>, SourceError>;
}

/// Decode the value at `(namespace, key)` into `destination`.
///
/// Returns `Ok(false)` and leaves `destination` untouched when the key is
/// absent. A present value that does not fit the destination shape is a
/// [`Error::SourceDecode`].
pub fn try_read<T: DeserializeOwned>(
    source: &dyn SourceReader,
    namespace: &str,
    key: &str,
    destination: &mut T,
) -> Result<bool> {
    let Some(value) = source.lookup(namespace, key)? else {
        return Ok(false);
    };
    *destination = serde_json::from_value(value).map_err(|e| Error::SourceDecode {
        namespace: namespace.to_string(),
        key: key.to_string(),
        message: e.to_string(),
    })?;
    Ok(true)
}

/// Like [`try_read`], but an absent key is an [`Error::NotFound`].
pub fn read<T: DeserializeOwned>(
    source: &dyn SourceReader,
    namespace: &str,
    key: &str,
    destination: &mut T,
) -> Result<()> {
    if try_read(source, namespace, key, destination)? {
        Ok(())
    } else {
        Err(Error::NotFound {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
    }
}

/// In-memory source keyed by `"namespace:key"`.
///
/// Values are kept as raw strings. A raw string that parses as JSON is
/// returned structurally; anything else is returned as a JSON string, so
/// `"us-east-1"` and `"\"us-east-1\""` read the same.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a `"namespace:key"` entry.
    pub fn with(mut self, namespaced_key: impl Into<String>, raw: impl Into<String>) -> Self {
        self.entries.insert(namespaced_key.into(), raw.into());
        self
    }

    pub fn insert(&mut self, namespace: &str, key: &str, raw: impl Into<String>) {
        self.entries.insert(format!("{namespace}:{key}"), raw.into());
    }

    /// Parse a JSON object mapping `"namespace:key"` to raw string values.
    pub fn from_json_map(content: &str) -> std::result::Result<Self, SourceError> {
        let entries: BTreeMap<String, String> =
            serde_json::from_str(content).map_err(|e| SourceError::Parse {
                path: PathBuf::from("<inline>"),
                format: "JSON".into(),
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SourceReader for MemorySource {
    fn lookup(&self, namespace: &str, key: &str) -> std::result::Result<Option<Value>, SourceError> {
        Ok(self
            .entries
            .get(&format!("{namespace}:{key}"))
            .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))))
    }
}

/// Document format of a [`FileSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> std::result::Result<Self, SourceError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(SourceError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

/// Source backed by one document whose top-level tables are namespaces.
///
/// ```toml
/// [project]
/// org_id = 123
///
/// [esc.digital_ocean]
/// region = "us-west-1"
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    root: Value,
}

impl FileSource {
    /// Load a document, detecting the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, SourceError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse_at(path, &content, format)?;
        tracing::debug!(path = %path.display(), format = format.name(), "Loaded file source");
        Ok(source)
    }

    /// Parse an in-memory document.
    pub fn parse(content: &str, format: Format) -> std::result::Result<Self, SourceError> {
        Self::parse_at(Path::new("<inline>"), content, format)
    }

    fn parse_at(path: &Path, content: &str, format: Format) -> std::result::Result<Self, SourceError> {
        let parse_error = |message: String| SourceError::Parse {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        };
        let root: Value = match format {
            Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };
        if !root.is_object() && !root.is_null() {
            return Err(parse_error("top level must be a table of namespaces".into()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Namespaces present in the document.
    pub fn namespaces(&self) -> Vec<String> {
        self.root
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl SourceReader for FileSource {
    fn lookup(&self, namespace: &str, key: &str) -> std::result::Result<Option<Value>, SourceError> {
        Ok(self
            .root
            .get(namespace)
            .and_then(|section| section.get(key))
            .cloned())
    }
}

/// Stack of sources; the first source holding a key answers for it.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn SourceReader>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority layer.
    pub fn with(mut self, layer: impl SourceReader + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn push(&mut self, layer: Box<dyn SourceReader>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl SourceReader for LayeredSource {
    fn lookup(&self, namespace: &str, key: &str) -> std::result::Result<Option<Value>, SourceError> {
        for layer in &self.layers {
            if let Some(value) = layer.lookup(namespace, key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
