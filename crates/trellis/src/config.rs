//! TOML definitions for directory layouts
//!
//! A layout can be described in a config file and compiled into a ready
//! [`DirectoryLayout`]:
//!
//! ```toml
//! root = "~/catalog/books"
//!
//! [encoding]
//! kind = "named_hierarchical"
//! field_name_delimiter = "="
//! ```

use crate::error::{LayoutError, Result};
use crate::layout::{DirectoryLayout, DEFAULT_FIELD_DELIMITER, DEFAULT_FIELD_NAME_DELIMITER};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Encoding parameters for one layout, as written in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodingConfig {
    /// Positional fields in the filename.
    Flat {
        fields: Vec<String>,
        #[serde(default = "default_field_delimiter")]
        field_delimiter: String,
    },
    /// `name=value` tokens in the filename.
    NamedFlat {
        #[serde(default = "default_field_delimiter")]
        field_delimiter: String,
        #[serde(default = "default_field_name_delimiter")]
        field_name_delimiter: String,
    },
    /// Positional fields, one per directory level.
    Hierarchical { fields: Vec<String> },
    /// `name=value` directory segments.
    NamedHierarchical {
        #[serde(default = "default_field_name_delimiter")]
        field_name_delimiter: String,
    },
}

fn default_field_delimiter() -> String {
    DEFAULT_FIELD_DELIMITER.to_string()
}

fn default_field_name_delimiter() -> String {
    DEFAULT_FIELD_NAME_DELIMITER.to_string()
}

/// A layout definition: root directory plus encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Root directory; `~` expands against the home directory at build time.
    pub root: String,
    pub encoding: EncodingConfig,
}

impl LayoutConfig {
    /// Load a layout definition from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LayoutConfig =
            toml::from_str(&content).map_err(|e| LayoutError::Config(e.to_string()))?;
        debug!(path = %path.display(), "loaded layout config");
        Ok(config)
    }

    /// Save this definition to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LayoutError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "saved layout config");
        Ok(())
    }

    /// Compile the definition into a ready [`DirectoryLayout`].
    ///
    /// Delimiter and root validation happen here, not at load time.
    pub fn build(&self) -> Result<DirectoryLayout> {
        match &self.encoding {
            EncodingConfig::Flat {
                fields,
                field_delimiter,
            } => DirectoryLayout::flat(&self.root, fields.clone(), field_delimiter),
            EncodingConfig::NamedFlat {
                field_delimiter,
                field_name_delimiter,
            } => DirectoryLayout::named_flat(&self.root, field_delimiter, field_name_delimiter),
            EncodingConfig::Hierarchical { fields } => {
                DirectoryLayout::hierarchical(&self.root, fields.clone())
            }
            EncodingConfig::NamedHierarchical {
                field_name_delimiter,
            } => DirectoryLayout::named_hierarchical(&self.root, field_name_delimiter),
        }
    }
}
