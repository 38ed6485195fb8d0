//! Candidate-path discovery
//!
//! Two strategies: a shallow glob over the root for flat encodings and a
//! recursive walk for hierarchical ones. Both are lazy pull-based iterators
//! that own their directory handles, so dropping one mid-stream releases
//! everything it holds open.

use crate::error::{LayoutError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wildcard for shallow discovery: immediate children with a dot in the name.
const SHALLOW_PATTERN: &str = "*.*";

/// Lazy stream of candidate paths under a layout root.
///
/// Items are root-prefixed paths. Traversal failures (an unreadable
/// directory mid-walk, an unreadable matched entry) surface as `Err` items
/// at the position the underlying primitive reports them.
pub enum Discover {
    /// Immediate children of the root matching `*.*`, alphabetical.
    Shallow(glob::Paths),
    /// Every file at any depth, directories top-down, sibling order
    /// filesystem-dependent.
    Walk(walkdir::IntoIter),
}

impl Discover {
    pub(crate) fn shallow(root: &Path) -> Result<Self> {
        let mut pattern = glob::Pattern::escape(&root.to_string_lossy());
        pattern.push('/');
        pattern.push_str(SHALLOW_PATTERN);
        debug!(root = %root.display(), pattern = %pattern, "shallow discovery");
        let paths = glob::glob(&pattern)
            .map_err(|e| LayoutError::Pattern(format!("{}: {}", pattern, e)))?;
        Ok(Discover::Shallow(paths))
    }

    pub(crate) fn walk(root: &Path) -> Self {
        debug!(root = %root.display(), "recursive discovery");
        Discover::Walk(walkdir::WalkDir::new(root).into_iter())
    }
}

impl Iterator for Discover {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Discover::Shallow(paths) => {
                let item = paths.next()?;
                Some(item.map_err(LayoutError::from))
            }
            Discover::Walk(walk) => loop {
                let entry = match walk.next()? {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(LayoutError::from(e))),
                };
                if entry.file_type().is_file() {
                    return Some(Ok(entry.into_path()));
                }
            },
        }
    }
}
