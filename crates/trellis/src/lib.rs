//! Directory-layout cataloging: structured records out of trees whose file
//! and folder names encode metadata.
//!
//! Files organized by naming convention carry their metadata in the path
//! itself, either packed into the filename ("flat") or spread across nested
//! directory names ("hierarchical"), positionally or as `name=value`
//! tokens. A [`DirectoryLayout`] binds a root directory to one of those
//! encodings and turns the tree into a lazy stream of [`FileEntry`]
//! records, filtered and enriched through selectors and augmenters, with
//! an optional Arrow [`IndexTable`] built over the result.
//!
//! # Example
//!
//! ```no_run
//! use trellis::{extension_selector, CollectOptions, DirectoryLayout};
//!
//! fn main() -> trellis::Result<()> {
//!     // One `name=value` token per directory level, e.g.
//!     // genre=dystopian/year=1949/1984.txt
//!     let layout = DirectoryLayout::named_hierarchical("~/catalog/books", "=")?;
//!
//!     let options = CollectOptions::new().path_selectors(vec![extension_selector("txt")]);
//!     for entry in layout.collect_with(options)? {
//!         let entry = entry?;
//!         println!("{} -> {:?}", entry.path().display(), entry.metadata());
//!     }
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod config;
pub mod delimiter;
pub mod discover;
pub mod entry;
pub mod error;
pub mod layout;
pub mod table;

pub use callbacks::{
    extension_selector, file_stats_augmenter, file_stats_augmenter_with_format, glob_selector,
    Augmenter, CollectOptions, MetadataSelector, PathSelector, SelectMode,
    FILE_STATS_TIME_FORMAT,
};
pub use config::{EncodingConfig, LayoutConfig};
pub use delimiter::{check_delimiter, RESERVED_DELIMITERS};
pub use discover::Discover;
pub use entry::{FileEntry, Metadata};
pub use error::{LayoutError, Result};
pub use layout::{
    Collect, DirectoryLayout, LayoutKind, DEFAULT_FIELD_DELIMITER, DEFAULT_FIELD_NAME_DELIMITER,
};
pub use table::IndexTable;
