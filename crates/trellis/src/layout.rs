//! Directory layouts: discovery, parsing, and the collection pipeline
//!
//! A [`DirectoryLayout`] binds a root directory to one of four encoding
//! variants and exposes the lazy [`collect`](DirectoryLayout::collect)
//! operation plus the index-table builder. Variants differ in where
//! metadata lives (filename vs. directory segments) and in how fields are
//! named (positional vs. `name=value` tokens):
//!
//! | Variant | Discovery | Fields |
//! |---|---|---|
//! | `Flat` | shallow | filename stem split by the field delimiter, zipped against declared names |
//! | `NamedFlat` | shallow | `name=value` tokens in the filename |
//! | `Hierarchical` | recursive | one directory segment per declared name, plus `filename` |
//! | `NamedHierarchical` | recursive | one `name=value` token per directory segment, plus `filename` |

use crate::callbacks::CollectOptions;
use crate::delimiter::check_delimiter;
use crate::discover::Discover;
use crate::entry::{FileEntry, Metadata};
use crate::error::{LayoutError, Result};
use crate::table::IndexTable;
use regex::Regex;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Default delimiter between positional metadata segments in one filename.
pub const DEFAULT_FIELD_DELIMITER: &str = "$";

/// Default delimiter between a field's name and its value.
pub const DEFAULT_FIELD_NAME_DELIMITER: &str = "=";

/// Encoding variant: how candidate paths are discovered and names parsed.
#[derive(Debug, Clone)]
pub enum LayoutKind {
    /// Positional fields packed into the filename.
    Flat {
        fields: Vec<String>,
        field_delimiter: String,
    },
    /// `name=value` tokens packed into the filename.
    NamedFlat {
        /// Compiled at construction from the two delimiters; values exclude
        /// `.` so a file extension is never swallowed.
        token_re: Regex,
    },
    /// Positional fields, one per directory segment.
    Hierarchical { fields: Vec<String> },
    /// One `name=value` token per directory segment.
    NamedHierarchical { field_name_delimiter: String },
}

impl LayoutKind {
    fn named_flat(field_delimiter: &str, field_name_delimiter: &str) -> Result<Self> {
        let fd = regex::escape(field_delimiter);
        let fnd = regex::escape(field_name_delimiter);
        let pattern = format!("([^{fd}{fnd}]+){fnd}([^{fd}\\.]+)");
        let token_re = Regex::new(&pattern)
            .map_err(|e| LayoutError::Pattern(format!("{}: {}", pattern, e)))?;
        Ok(LayoutKind::NamedFlat { token_re })
    }
}

/// A root directory bound to one encoding variant.
///
/// Immutable after construction; every collection call performs a fresh
/// traversal, nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    root: PathBuf,
    kind: LayoutKind,
}

impl DirectoryLayout {
    /// Flat layout: positional fields in the filename, shallow discovery.
    pub fn flat(
        root: impl AsRef<Path>,
        fields: Vec<String>,
        field_delimiter: &str,
    ) -> Result<Self> {
        check_delimiter(field_delimiter)?;
        Ok(Self {
            root: validate_root(root.as_ref())?,
            kind: LayoutKind::Flat {
                fields,
                field_delimiter: field_delimiter.to_string(),
            },
        })
    }

    /// Named-flat layout: `name=value` tokens in the filename, shallow
    /// discovery.
    pub fn named_flat(
        root: impl AsRef<Path>,
        field_delimiter: &str,
        field_name_delimiter: &str,
    ) -> Result<Self> {
        check_delimiter(field_delimiter)?;
        check_delimiter(field_name_delimiter)?;
        Ok(Self {
            root: validate_root(root.as_ref())?,
            kind: LayoutKind::named_flat(field_delimiter, field_name_delimiter)?,
        })
    }

    /// Hierarchical layout: one positional field per directory level,
    /// recursive discovery.
    pub fn hierarchical(root: impl AsRef<Path>, fields: Vec<String>) -> Result<Self> {
        Ok(Self {
            root: validate_root(root.as_ref())?,
            kind: LayoutKind::Hierarchical { fields },
        })
    }

    /// Named-hierarchical layout: one `name=value` token per directory
    /// level, recursive discovery.
    pub fn named_hierarchical(root: impl AsRef<Path>, field_name_delimiter: &str) -> Result<Self> {
        check_delimiter(field_name_delimiter)?;
        Ok(Self {
            root: validate_root(root.as_ref())?,
            kind: LayoutKind::NamedHierarchical {
                field_name_delimiter: field_name_delimiter.to_string(),
            },
        })
    }

    /// The validated (and `~`-expanded) root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> &LayoutKind {
        &self.kind
    }

    /// Lazy stream of candidate paths for this layout's strategy.
    pub fn discover(&self) -> Result<Discover> {
        match &self.kind {
            LayoutKind::Flat { .. } | LayoutKind::NamedFlat { .. } => {
                Discover::shallow(&self.root)
            }
            LayoutKind::Hierarchical { .. } | LayoutKind::NamedHierarchical { .. } => {
                Ok(Discover::walk(&self.root))
            }
        }
    }

    /// Extract metadata from one discovered path.
    ///
    /// Parsing is lenient: tokens that do not line up with the declared
    /// fields or the expected `name=value` shape are dropped, never an
    /// error. The returned entry's path is relative to the layout root.
    pub fn parse(&self, path: &Path) -> FileEntry {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let metadata = match &self.kind {
            LayoutKind::Flat {
                fields,
                field_delimiter,
            } => parse_flat(rel, fields, field_delimiter),
            LayoutKind::NamedFlat { token_re } => parse_named_flat(rel, token_re),
            LayoutKind::Hierarchical { fields } => parse_hierarchical(rel, fields),
            LayoutKind::NamedHierarchical {
                field_name_delimiter,
            } => parse_named_hierarchical(rel, field_name_delimiter),
        };
        FileEntry::new(rel, metadata)
    }

    /// Collect with no selectors and no augmenters.
    pub fn collect(&self) -> Result<Collect<'_>> {
        self.collect_with(CollectOptions::new())
    }

    /// Lazily discover, filter, parse, augment, and yield entries.
    ///
    /// Per discovered path: path selectors run against the raw path first,
    /// so filtered-out paths are never parsed; then the path is parsed,
    /// metadata selectors run, augmenters thread the metadata through in
    /// order, and the entry is yielded with its full path. Nothing happens
    /// until the iterator is pulled; dropping it releases the traversal.
    pub fn collect_with(&self, options: CollectOptions) -> Result<Collect<'_>> {
        Ok(Collect {
            layout: self,
            discovered: self.discover()?,
            options,
        })
    }

    /// Join a relative path onto the root.
    ///
    /// Paths that are already absolute or already under the root pass
    /// through unchanged, so re-resolving collected entries is harmless.
    /// With `as_absolute` the result is canonicalized when possible,
    /// falling back to the joined form.
    pub fn full_path(&self, path: &Path, as_absolute: bool) -> PathBuf {
        let joined = if path.is_absolute() || path.starts_with(&self.root) {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if as_absolute {
            joined.canonicalize().unwrap_or(joined)
        } else {
            joined
        }
    }

    /// Build an [`IndexTable`] from collected entries.
    ///
    /// One row per entry, one column per distinct metadata key across all
    /// entries; rows missing a key get a null cell. `add_filepath` injects
    /// a `filepath` column holding each entry's full path. `index_fields`
    /// names the columns forming the row index (empty slice for none);
    /// uniqueness is not enforced, lookups return the first match.
    pub fn build_index_table<I>(
        &self,
        entries: I,
        index_fields: &[&str],
        add_filepath: bool,
    ) -> Result<IndexTable>
    where
        I: IntoIterator<Item = FileEntry>,
    {
        let mut rows = Vec::new();
        for entry in entries {
            let (path, mut metadata) = entry.into_parts();
            if add_filepath {
                let full = self.full_path(&path, false);
                metadata.insert(
                    "filepath".to_string(),
                    Value::from(full.to_string_lossy().as_ref()),
                );
            }
            rows.push(metadata);
        }
        IndexTable::from_rows(rows, index_fields)
    }
}

/// Lazy iterator over collected entries, `Item = Result<FileEntry>`.
///
/// Dropping it mid-stream releases the underlying directory handles.
pub struct Collect<'a> {
    layout: &'a DirectoryLayout,
    discovered: Discover,
    options: CollectOptions,
}

impl Iterator for Collect<'_> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.discovered.next()? {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };
            if !self.options.select_path(&path) {
                continue;
            }
            let (rel, metadata) = self.layout.parse(&path).into_parts();
            if !self.options.select_metadata(&metadata) {
                continue;
            }
            let full = self.layout.full_path(&rel, false);
            let metadata = self.options.augment(&full, metadata);
            return Some(Ok(FileEntry::new(full, metadata)));
        }
    }
}

fn parse_flat(rel: &Path, fields: &[String], field_delimiter: &str) -> Metadata {
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    fields
        .iter()
        .zip(stem.split(field_delimiter).filter(|t| !t.is_empty()))
        .map(|(field, token)| (field.clone(), Value::from(token)))
        .collect()
}

fn parse_named_flat(rel: &Path, token_re: &Regex) -> Metadata {
    let name = rel
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    token_re
        .captures_iter(&name)
        .map(|cap| (cap[1].to_string(), Value::from(&cap[2])))
        .collect()
}

fn parse_hierarchical(rel: &Path, fields: &[String]) -> Metadata {
    let mut metadata: Metadata = fields
        .iter()
        .zip(dir_segments(rel))
        .map(|(field, segment)| (field.clone(), Value::from(segment)))
        .collect();
    insert_filename(&mut metadata, rel);
    metadata
}

fn parse_named_hierarchical(rel: &Path, field_name_delimiter: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for segment in dir_segments(rel) {
        // One name=value token per segment; segments without the
        // delimiter carry no field.
        if let Some((name, value)) = segment.split_once(field_name_delimiter) {
            metadata.insert(name.to_string(), Value::from(value));
        }
    }
    insert_filename(&mut metadata, rel);
    metadata
}

/// Directory components of a relative path, terminal component excluded.
fn dir_segments(rel: &Path) -> impl Iterator<Item = String> + '_ {
    rel.parent()
        .into_iter()
        .flat_map(|p| p.components())
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
}

fn insert_filename(metadata: &mut Metadata, rel: &Path) {
    if let Some(name) = rel.file_name() {
        metadata.insert(
            "filename".to_string(),
            Value::from(name.to_string_lossy().as_ref()),
        );
    }
}

fn validate_root(root: &Path) -> Result<PathBuf> {
    let root = expand_root(root);
    if !root.exists() {
        return Err(LayoutError::RootNotFound(root));
    }
    if !root.is_dir() {
        return Err(LayoutError::NotADirectory(root));
    }
    Ok(root)
}

/// Expand a leading `~` against the home directory.
fn expand_root(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}
