//! Core record types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata extracted from one file's path.
///
/// Values are strings as parsed; augmenters may replace or add richer JSON
/// types (numbers, booleans, timestamps as formatted strings).
pub type Metadata = BTreeMap<String, Value>;

/// One discovered file together with its extracted metadata.
///
/// Immutable once built. The path is root-relative when the entry comes
/// from [`parse`](crate::DirectoryLayout::parse) and a full root-joined
/// path when it comes from [`collect`](crate::DirectoryLayout::collect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    path: PathBuf,
    metadata: Metadata,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, metadata: Metadata) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// String value of one metadata field, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(Value::as_str)
    }

    /// Consume the entry into its `(path, metadata)` parts.
    pub fn into_parts(self) -> (PathBuf, Metadata) {
        (self.path, self.metadata)
    }
}
