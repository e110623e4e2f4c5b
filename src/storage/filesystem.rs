//! File system operations
//!
//! Local filesystem implementation of [`Storage`] built on `tokio::fs`.

use async_trait::async_trait;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::TransferSettings;
use crate::error::StorageError;
use crate::storage::Storage;
use crate::storage::results::{Blob, CreateOptions, Entry, FileEntry, FileMetadata};
use crate::storage::validation::sanitize_filename;
use crate::utils::uri::to_local_path;

/// Storage rooted in local directories
#[derive(Debug, Clone)]
pub struct LocalStorage {
    persistent_root: PathBuf,
    external_root: Option<String>,
}

impl LocalStorage {
    pub fn new(persistent_root: impl Into<PathBuf>) -> Self {
        Self {
            persistent_root: persistent_root.into(),
            external_root: None,
        }
    }

    /// Offer `location` as the default save location for downloads.
    pub fn with_external_root(mut self, location: impl Into<String>) -> Self {
        self.external_root = Some(location.into());
        self
    }

    pub fn from_settings(settings: &TransferSettings) -> Self {
        Self {
            persistent_root: settings.persistent_root_path(),
            external_root: settings.external_storage_root.clone(),
        }
    }

    pub fn persistent_root(&self) -> &PathBuf {
        &self.persistent_root
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn external_storage_root(&self) -> Option<String> {
        self.external_root.clone()
    }

    async fn resolve_path(&self, location: &str) -> Result<Entry, StorageError> {
        let path = to_local_path(location);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::DirectoryNotFound(location.to_string()));
            }
            Err(e) => return Err(StorageError::from(e)),
        };

        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(location.to_string()));
        }

        debug!("Resolved location {} to {}", location, path.display());
        Ok(Entry::new(path))
    }

    async fn default_root(&self) -> Result<Entry, StorageError> {
        fs::create_dir_all(&self.persistent_root).await?;
        let metadata = fs::metadata(&self.persistent_root).await?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(
                self.persistent_root.to_string_lossy().to_string(),
            ));
        }
        Ok(Entry::new(self.persistent_root.clone()))
    }

    async fn create_file(
        &self,
        dir: &Entry,
        name: &str,
        options: CreateOptions,
    ) -> Result<FileEntry, StorageError> {
        let name = sanitize_filename(name)?;
        let path = dir.path().join(name);

        let mut open = OpenOptions::new();
        open.write(true);
        if options.create && options.exclusive {
            open.create_new(true);
        } else if options.create {
            open.create(true);
        }

        match open.open(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::FileAlreadyExists(path.to_string_lossy().to_string()));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::FileNotFound(path.to_string_lossy().to_string()));
            }
            Err(e) => return Err(StorageError::from(e)),
        }

        info!("Prepared file entry {}", path.display());
        Ok(FileEntry::new(name, path))
    }

    async fn write_file(&self, file: &FileEntry, blob: &Blob) -> Result<(), StorageError> {
        let mut handle = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(file.path())
            .await?;
        handle.write_all(blob.bytes()).await?;
        handle.flush().await?;

        info!(
            "Wrote {} bytes to {} ({})",
            blob.len(),
            file.path().display(),
            if blob.mime_type().is_empty() { "unknown type" } else { blob.mime_type() }
        );
        Ok(())
    }

    async fn remove_file(&self, file: &FileEntry) -> Result<(), StorageError> {
        match fs::remove_file(file.path()).await {
            Ok(()) => {
                info!("Removed {}", file.path().display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    async fn resolve_file(&self, uri: &str) -> Result<FileEntry, StorageError> {
        let path = to_local_path(uri);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::FileNotFound(uri.to_string()));
            }
            Err(e) => return Err(StorageError::from(e)),
        };

        if !metadata.is_file() {
            return Err(StorageError::InvalidPath(uri.to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StorageError::InvalidPath(uri.to_string()))?;
        Ok(FileEntry::new(name, path))
    }

    async fn metadata(&self, file: &FileEntry) -> Result<FileMetadata, StorageError> {
        let metadata = fs::metadata(file.path()).await?;
        Ok(FileMetadata {
            name: file.name().to_string(),
            size: metadata.len(),
        })
    }

    async fn read_bytes(&self, file: &FileEntry) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(file.path()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_path_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.resolve_path(dir.path().to_str().unwrap()).await.is_ok());

        let missing = dir.path().join("missing");
        let err = storage.resolve_path(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, StorageError::DirectoryNotFound(_)));

        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = storage.resolve_path(file.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn default_root_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("root");
        let storage = LocalStorage::new(&root);

        let entry = storage.default_root().await.unwrap();
        assert_eq!(entry.path(), root.as_path());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn create_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let root = storage.default_root().await.unwrap();

        let entry = storage
            .create_file(&root, "data.bin", CreateOptions::default())
            .await
            .unwrap();
        storage
            .write_file(&entry, &Blob::new(vec![0, 159, 146, 150, 255], "application/octet-stream"))
            .await
            .unwrap();

        let resolved = storage.resolve_file(&entry.to_uri()).await.unwrap();
        assert_eq!(resolved.name(), "data.bin");
        assert_eq!(storage.read_bytes(&resolved).await.unwrap(), vec![0, 159, 146, 150, 255]);
        assert_eq!(storage.metadata(&resolved).await.unwrap().size, 5);
    }

    #[tokio::test]
    async fn non_exclusive_create_overwrites_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"old content").unwrap();
        let storage = LocalStorage::new(dir.path());
        let root = storage.default_root().await.unwrap();

        let entry = storage
            .create_file(&root, "a.txt", CreateOptions::default())
            .await
            .unwrap();
        storage.write_file(&entry, &Blob::new(b"new".to_vec(), "text/plain")).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn remove_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let root = storage.default_root().await.unwrap();
        let entry = storage
            .create_file(&root, "partial.bin", CreateOptions::default())
            .await
            .unwrap();

        storage.remove_file(&entry).await.unwrap();
        assert!(!dir.path().join("partial.bin").exists());
        storage.remove_file(&entry).await.unwrap();
    }

    #[tokio::test]
    async fn exclusive_create_fails_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        let storage = LocalStorage::new(dir.path());
        let root = storage.default_root().await.unwrap();

        let options = CreateOptions {
            create: true,
            exclusive: true,
        };
        let err = storage.create_file(&root, "a.txt", options).await.unwrap_err();
        assert!(matches!(err, StorageError::FileAlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let root = storage.default_root().await.unwrap();

        let err = storage
            .create_file(&root, "../escape.txt", CreateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn resolve_file_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let uri = format!("file://{}/nothing.txt", dir.path().display());
        let err = storage.resolve_file(&uri).await.unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound(_)));
    }
}
