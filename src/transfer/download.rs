//! Downloads
//!
//! Remote to local transfers: GET the resource and persist it into a file
//! entry of the storage subsystem.

use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::TransferSettings;
use crate::error::TransferError;
use crate::mime::{file_type_of, mime_type_for};
use crate::storage::{Blob, CreateOptions, Entry, FileEntry, Storage};
use crate::transfer::callbacks::TransferCallbacks;
use crate::transfer::operations::{CancelToken, Operation, TransferHandle};
use crate::transfer::params::ParamValue;
use crate::transfer::results::TransferOutcome;
use crate::transfer::state::TransferState;
use crate::transport::{Transport, TransportRequest};
use crate::utils::uri::decode_uri;

const HTTP_OK: u16 = 200;

/// What to download and where to put it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Resource to fetch
    pub url: String,
    /// Target file name including its extension, e.g. `who killed me.doc`
    pub filename: String,
    /// Directory (path or `file://` URI) to save into; the storage default
    /// is used when absent
    pub save_location: Option<String>,
    /// Send credentials with the request
    pub with_credentials: bool,
    /// Not sent by downloads; encode query parameters into `url`
    pub params: BTreeMap<String, ParamValue>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            filename: String::new(),
            save_location: None,
            with_credentials: true,
            params: BTreeMap::new(),
        }
    }
}

impl DownloadConfig {
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn save_location(mut self, location: impl Into<String>) -> Self {
        self.save_location = Some(location.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Where the downloaded file goes
#[derive(Debug, Clone, PartialEq, Eq)]
enum SaveTarget {
    Location(String),
    DefaultRoot,
}

/// Validated, decoded inputs of a download
#[derive(Debug)]
struct DownloadPlan {
    url: String,
    filename: String,
    target: SaveTarget,
    mime_type: &'static str,
}

/// Checks the configuration and works out the save target and MIME type.
/// Performs no I/O.
fn prepare<S: Storage>(config: &DownloadConfig, storage: &S) -> Result<DownloadPlan, TransferError> {
    if config.url.is_empty() {
        warn!("url is empty, nothing to download");
        return Err(TransferError::NoUrl);
    }
    if config.filename.is_empty() {
        warn!("filename is empty, cannot save download from {}", config.url);
        return Err(TransferError::NoFilename);
    }

    if !config.params.is_empty() {
        info!(
            "Ignoring {} params for download; add them to the url instead",
            config.params.len()
        );
    }

    let target = match config.save_location.as_deref().filter(|l| !l.is_empty()) {
        Some(location) => SaveTarget::Location(location.to_string()),
        None => match storage.external_storage_root().filter(|l| !l.is_empty()) {
            Some(location) => SaveTarget::Location(location),
            None => {
                info!("No external storage location available, saving into the default persistent root");
                SaveTarget::DefaultRoot
            }
        },
    };

    let file_type = file_type_of(&config.filename);
    let mime_type = mime_type_for(file_type);
    if file_type.is_empty() {
        info!("File type is not defined, please check your filename: {}", config.filename);
    } else if mime_type.is_empty() {
        info!("MIME type is not defined for file type: {}", file_type);
    }

    Ok(DownloadPlan {
        url: decode_uri(&config.url),
        filename: decode_uri(&config.filename),
        target,
        mime_type,
    })
}

/// A single download operation.
///
/// Consumed by [`Downloader::run`] or [`Downloader::download`]; a finished
/// downloader cannot be restarted.
pub struct Downloader<S: Storage, T: Transport> {
    config: DownloadConfig,
    storage: Arc<S>,
    transport: Arc<T>,
    settings: TransferSettings,
    callbacks: TransferCallbacks<FileEntry>,
    cancel: CancelToken,
}

impl<S: Storage, T: Transport> Downloader<S, T> {
    pub fn new(config: DownloadConfig, storage: Arc<S>, transport: Arc<T>) -> Self {
        Self {
            config,
            storage,
            transport,
            settings: TransferSettings::default(),
            callbacks: TransferCallbacks::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_callbacks(mut self, callbacks: TransferCallbacks<FileEntry>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Token that cancels this download when triggered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Start the download on the tokio runtime.
    pub fn download(self) -> TransferHandle<FileEntry> {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        TransferHandle::new(cancel, task)
    }

    /// Drive the download to its terminal outcome.
    pub async fn run(self) -> TransferOutcome<FileEntry> {
        let Downloader {
            config,
            storage,
            transport,
            settings,
            callbacks,
            cancel,
        } = self;

        let mut op = Operation::new("download", callbacks, cancel, settings.stage_timeout());
        if op.cancel_requested() {
            return op.cancelled();
        }

        op.enter(TransferState::Validating);
        let plan = match prepare(&config, storage.as_ref()) {
            Ok(plan) => plan,
            Err(e) => return op.fail(e),
        };

        op.enter(TransferState::ResolvingLocation);
        let dir: Entry = match &plan.target {
            SaveTarget::DefaultRoot => match op.suspend(storage.default_root()).await {
                Ok(Ok(entry)) => entry,
                Ok(Err(e)) => return op.fail(TransferError::FileSystem(e)),
                Err(interrupt) => return op.interrupted(interrupt),
            },
            SaveTarget::Location(location) => {
                match op.suspend(storage.resolve_path(location)).await {
                    Ok(Ok(entry)) => entry,
                    Ok(Err(e)) => {
                        return op.fail(TransferError::LocalFileSystem {
                            location: location.clone(),
                            source: e,
                        });
                    }
                    Err(interrupt) => return op.interrupted(interrupt),
                }
            }
        };

        op.enter(TransferState::Exchanging);
        let request = TransportRequest::get(plan.url.clone()).with_credentials(config.with_credentials);
        let response = match op.exchange(transport, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return op.fail(TransferError::Network(e)),
            Err(interrupt) => return op.interrupted(interrupt),
        };

        if response.status != HTTP_OK {
            return op.fail(TransferError::HttpStatus(response.status));
        }
        let blob = Blob::new(response.body, plan.mime_type);

        op.enter(TransferState::Persisting);
        let options = CreateOptions {
            create: true,
            exclusive: false,
        };
        let entry = match op.suspend(storage.create_file(&dir, &plan.filename, options)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                return op.fail(TransferError::SaveFile {
                    filename: plan.filename,
                    source: e,
                });
            }
            Err(interrupt) => return op.interrupted(interrupt),
        };

        match op.suspend(storage.write_file(&entry, &blob)).await {
            Ok(Ok(())) => {
                info!("Downloaded {} into {}", plan.url, entry.path().display());
                op.succeed(entry)
            }
            Ok(Err(e)) => op.fail(TransferError::WriteFile {
                filename: plan.filename,
                source: e,
            }),
            Err(interrupt) => {
                if let Err(e) = storage.remove_file(&entry).await {
                    warn!("Could not remove partial file {}: {}", entry.path().display(), e);
                }
                op.interrupted(interrupt)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;

    #[test]
    fn credentials_default_to_on() {
        let config = DownloadConfig::new("http://example.com/a.pdf", "a.pdf");
        assert!(config.with_credentials);
        assert!(config.save_location.is_none());
    }

    #[test]
    fn prepare_decodes_and_resolves_mime() {
        let storage = LocalStorage::new("/tmp/unused");
        let config = DownloadConfig::new("http://example.com/who%20killed%20me.doc", "who%20killed%20me.doc")
            .save_location("/data");
        let plan = prepare(&config, &storage).unwrap();

        assert_eq!(plan.url, "http://example.com/who killed me.doc");
        assert_eq!(plan.filename, "who killed me.doc");
        assert_eq!(plan.mime_type, "application/msword");
        assert_eq!(plan.target, SaveTarget::Location("/data".to_string()));
    }

    #[test]
    fn prepare_prefers_external_root_then_default_root() {
        let config = DownloadConfig::new("http://example.com/a.bin", "a.bin");

        let external = LocalStorage::new("/tmp/unused").with_external_root("/sdcard/app");
        let plan = prepare(&config, &external).unwrap();
        assert_eq!(plan.target, SaveTarget::Location("/sdcard/app".to_string()));

        let plain = LocalStorage::new("/tmp/unused");
        let plan = prepare(&config, &plain).unwrap();
        assert_eq!(plan.target, SaveTarget::DefaultRoot);
    }

    #[test]
    fn prepare_checks_url_before_filename() {
        let storage = LocalStorage::new("/tmp/unused");
        let err = prepare(&DownloadConfig::default(), &storage).unwrap_err();
        assert!(matches!(err, TransferError::NoUrl));

        let err = prepare(&DownloadConfig::new("http://example.com/x", ""), &storage).unwrap_err();
        assert!(matches!(err, TransferError::NoFilename));
    }

    #[test]
    fn unknown_extension_is_not_fatal() {
        let storage = LocalStorage::new("/tmp/unused");
        let plan = prepare(&DownloadConfig::new("http://example.com/x", "notes.xyz"), &storage).unwrap();
        assert_eq!(plan.mime_type, "");
    }
}
