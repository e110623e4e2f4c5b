//! Persistent storage
//!
//! The [`Storage`] trait is the boundary to the host's persistent storage:
//! location resolution, file entry creation, reads and writes.
//! [`LocalStorage`] implements it on the local filesystem.

pub mod filesystem;
pub mod results;
pub mod validation;

use async_trait::async_trait;

use crate::error::StorageError;

pub use filesystem::LocalStorage;
pub use results::{Blob, CreateOptions, Entry, FileEntry, FileMetadata};

/// Storage subsystem consumed by transfer operations.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Default external location to save into, `None` when the host
    /// offers none.
    fn external_storage_root(&self) -> Option<String>;

    /// Resolve an explicit location (path or `file://` URI) to a directory.
    async fn resolve_path(&self, location: &str) -> Result<Entry, StorageError>;

    /// The storage subsystem's default persistent root.
    async fn default_root(&self) -> Result<Entry, StorageError>;

    /// Get or create the file `name` under `dir`.
    async fn create_file(
        &self,
        dir: &Entry,
        name: &str,
        options: CreateOptions,
    ) -> Result<FileEntry, StorageError>;

    /// Replace the content of `file` with `blob`.
    ///
    /// The write may be dropped part way on cancellation or timeout; the
    /// caller then removes the entry with [`Storage::remove_file`].
    async fn write_file(&self, file: &FileEntry, blob: &Blob) -> Result<(), StorageError>;

    /// Delete `file`. Removing an entry that no longer exists succeeds.
    async fn remove_file(&self, file: &FileEntry) -> Result<(), StorageError>;

    /// Resolve a file URI to a file handle.
    async fn resolve_file(&self, uri: &str) -> Result<FileEntry, StorageError>;

    async fn metadata(&self, file: &FileEntry) -> Result<FileMetadata, StorageError>;

    /// Read the whole file as raw bytes.
    async fn read_bytes(&self, file: &FileEntry) -> Result<Vec<u8>, StorageError>;
}
