//! Path validation
//!
//! Handles file name validation for entries created in storage.

use crate::error::StorageError;

/// Validate a file name for creation inside a directory entry.
///
/// Rejects empty names, traversal components, path separators and NUL.
pub fn sanitize_filename(filename: &str) -> Result<&str, StorageError> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
    {
        return Err(StorageError::InvalidPath(filename.to_string()));
    }
    Ok(filename)
}
