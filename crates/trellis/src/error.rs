//! Error types for directory-layout cataloging

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Delimiter {0:?} collides with a reserved filesystem character")]
    InvalidDelimiter(String),

    #[error("Invalid select mode {0:?} (expected \"all\" or \"any\")")]
    InvalidSelectMode(String),

    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LayoutError>;
