//! Selector and augmenter pipeline
//!
//! Callers filter and enrich records during collection by supplying path
//! selectors, metadata selectors, and augmenters. Each may be given singly
//! or in batches; everything is normalized to a sequence and selector
//! verdicts are reduced under a [`SelectMode`].

use crate::entry::Metadata;
use crate::error::{LayoutError, Result};
use chrono::{DateTime, Local};
use globset::GlobBuilder;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

/// Predicate over a discovered (not yet parsed) path.
pub type PathSelector = Box<dyn Fn(&Path) -> bool>;

/// Predicate over parsed metadata.
pub type MetadataSelector = Box<dyn Fn(&Metadata) -> bool>;

/// Transform applied to metadata before an entry is yielded.
///
/// Receives the full path of the file and the metadata produced by the
/// previous augmenter (or by parsing, for the first in the chain).
pub type Augmenter = Box<dyn Fn(&Path, Metadata) -> Metadata>;

/// How the verdicts of multiple selectors combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Every selector must pass (conjunction).
    #[default]
    All,
    /// At least one selector must pass (disjunction).
    Any,
}

impl SelectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectMode::All => "all",
            SelectMode::Any => "any",
        }
    }
}

impl FromStr for SelectMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(SelectMode::All),
            "any" => Ok(SelectMode::Any),
            other => Err(LayoutError::InvalidSelectMode(other.to_string())),
        }
    }
}

/// Options for one collection run.
///
/// Selectors and augmenters may be appended one at a time or in batches;
/// both forms land in the same sequence, applied in insertion order.
#[derive(Default)]
pub struct CollectOptions {
    path_selectors: Vec<PathSelector>,
    metadata_selectors: Vec<MetadataSelector>,
    augmenters: Vec<Augmenter>,
    mode: SelectMode,
}

impl CollectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one path selector.
    pub fn path_selector(mut self, selector: impl Fn(&Path) -> bool + 'static) -> Self {
        self.path_selectors.push(Box::new(selector));
        self
    }

    /// Append a batch of path selectors.
    pub fn path_selectors(mut self, selectors: impl IntoIterator<Item = PathSelector>) -> Self {
        self.path_selectors.extend(selectors);
        self
    }

    /// Append one metadata selector.
    pub fn metadata_selector(mut self, selector: impl Fn(&Metadata) -> bool + 'static) -> Self {
        self.metadata_selectors.push(Box::new(selector));
        self
    }

    /// Append a batch of metadata selectors.
    pub fn metadata_selectors(
        mut self,
        selectors: impl IntoIterator<Item = MetadataSelector>,
    ) -> Self {
        self.metadata_selectors.extend(selectors);
        self
    }

    /// Append one augmenter.
    pub fn augmenter(mut self, augmenter: impl Fn(&Path, Metadata) -> Metadata + 'static) -> Self {
        self.augmenters.push(Box::new(augmenter));
        self
    }

    /// Append a batch of augmenters.
    pub fn augmenters(mut self, augmenters: impl IntoIterator<Item = Augmenter>) -> Self {
        self.augmenters.extend(augmenters);
        self
    }

    pub fn select_mode(mut self, mode: SelectMode) -> Self {
        self.mode = mode;
        self
    }

    /// String form of the mode, for config-driven callers.
    ///
    /// Anything other than `"all"` or `"any"` fails here, before any
    /// filesystem work starts.
    pub fn select_mode_str(self, mode: &str) -> Result<Self> {
        Ok(self.select_mode(mode.parse()?))
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub(crate) fn select_path(&self, path: &Path) -> bool {
        reduce(&self.path_selectors, self.mode, |s| s(path))
    }

    pub(crate) fn select_metadata(&self, metadata: &Metadata) -> bool {
        reduce(&self.metadata_selectors, self.mode, |s| s(metadata))
    }

    /// Thread metadata through the augmenter chain in order.
    pub(crate) fn augment(&self, path: &Path, metadata: Metadata) -> Metadata {
        self.augmenters
            .iter()
            .fold(metadata, |meta, augmenter| augmenter(path, meta))
    }
}

/// Reduce selector verdicts under the mode. An empty selector list passes
/// everything, regardless of mode.
fn reduce<T>(selectors: &[T], mode: SelectMode, mut verdict: impl FnMut(&T) -> bool) -> bool {
    if selectors.is_empty() {
        return true;
    }
    match mode {
        SelectMode::All => selectors.iter().all(|s| verdict(s)),
        SelectMode::Any => selectors.iter().any(|s| verdict(s)),
    }
}

// ============================================================================
// Provided selectors
// ============================================================================

/// Case-insensitive glob selector over the discovered path.
///
/// Bare patterns match at any depth (`"*.json"` behaves like `"**/*.json"`).
pub fn glob_selector(pattern: &str) -> Result<PathSelector> {
    let normalized = normalize_glob_pattern(pattern);
    let matcher = GlobBuilder::new(&normalized)
        .case_insensitive(true)
        .build()
        .map_err(|e| LayoutError::Pattern(format!("{}: {}", pattern, e)))?
        .compile_matcher();
    Ok(Box::new(move |path: &Path| matcher.is_match(path)))
}

/// Selector for one file extension (leading dot optional), case-insensitive.
pub fn extension_selector(extension: &str) -> PathSelector {
    let want = extension.trim_start_matches('.').to_ascii_lowercase();
    Box::new(move |path: &Path| {
        path.extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase() == want)
            .unwrap_or(false)
    })
}

/// Normalize a glob pattern for matching against discovered paths.
///
/// Rules:
/// - Empty or "*" becomes "**/*" (match all)
/// - Leading slashes are stripped
/// - Patterns without a path separator get "**/" prefix
fn normalize_glob_pattern(raw: &str) -> String {
    let mut pattern = raw.trim().trim_start_matches('/').to_string();

    if pattern.is_empty() || pattern == "*" {
        pattern = "**/*".to_string();
    }

    if !pattern.contains('/') && !pattern.starts_with("**/") {
        pattern = format!("**/{}", pattern);
    }

    pattern
}

// ============================================================================
// Provided augmenters
// ============================================================================

/// Timestamp format used by [`file_stats_augmenter`].
pub const FILE_STATS_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Augmenter that stats the file and records its size and timestamps.
///
/// Adds `file_size` (bytes, integer), `file_last_access` and
/// `file_last_modification` (local time, [`FILE_STATS_TIME_FORMAT`]), and
/// `file_created` where the platform reports a creation time. Metadata is
/// returned unchanged when the stat call fails.
pub fn file_stats_augmenter() -> Augmenter {
    file_stats_augmenter_with_format(FILE_STATS_TIME_FORMAT)
}

/// Same as [`file_stats_augmenter`] with a custom chrono format string.
pub fn file_stats_augmenter_with_format(time_format: &str) -> Augmenter {
    let format = time_format.to_string();
    Box::new(move |path: &Path, mut metadata: Metadata| {
        let stat = match std::fs::metadata(path) {
            Ok(stat) => stat,
            Err(_) => return metadata,
        };
        metadata.insert("file_size".to_string(), Value::from(stat.len()));
        if let Ok(accessed) = stat.accessed() {
            metadata.insert(
                "file_last_access".to_string(),
                Value::from(format_timestamp(accessed, &format)),
            );
        }
        if let Ok(modified) = stat.modified() {
            metadata.insert(
                "file_last_modification".to_string(),
                Value::from(format_timestamp(modified, &format)),
            );
        }
        if let Ok(created) = stat.created() {
            metadata.insert(
                "file_created".to_string(),
                Value::from(format_timestamp(created, &format)),
            );
        }
        metadata
    })
}

fn format_timestamp(time: SystemTime, format: &str) -> String {
    DateTime::<Local>::from(time).format(format).to_string()
}
