//! Storage result types
//!
//! Opaque handles and value types returned by storage operations.

use std::path::{Path, PathBuf};

use crate::utils::uri::to_file_uri;

/// Handle to a directory in persistent storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: PathBuf,
}

impl Entry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Handle to a file in persistent storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    path: PathBuf,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name without its directory
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URI of this entry
    pub fn to_uri(&self) -> String {
        to_file_uri(&self.path)
    }
}

/// Metadata of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
}

/// Flags for file entry creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Create the file when it does not exist
    pub create: bool,
    /// Fail when the file already exists
    pub exclusive: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            create: true,
            exclusive: false,
        }
    }
}

/// Binary payload labelled with a MIME type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// MIME type, empty when unknown
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
