//! Delimiter validation
//!
//! Field and field-name delimiters end up inside file and folder names, so
//! characters the filesystem reserves can never act as one.

use crate::error::{LayoutError, Result};

/// Characters that can never be used as a metadata delimiter.
pub const RESERVED_DELIMITERS: [&str; 9] = ["/", "\\", ":", "*", "?", "<", ">", "\"", "|"];

/// Reject a delimiter that is a member of the reserved set.
pub fn check_delimiter(delimiter: &str) -> Result<()> {
    if RESERVED_DELIMITERS.contains(&delimiter) {
        return Err(LayoutError::InvalidDelimiter(delimiter.to_string()));
    }
    Ok(())
}
