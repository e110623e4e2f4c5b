//! Uploads
//!
//! Local to remote transfers: read a stored file and POST it as a
//! multipart form together with any extra scalar fields.

use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::TransferSettings;
use crate::error::{StorageError, TransferError};
use crate::mime::{file_type_of, mime_type_for};
use crate::storage::{Blob, Storage};
use crate::transfer::callbacks::TransferCallbacks;
use crate::transfer::operations::{CancelToken, Operation, TransferHandle};
use crate::transfer::params::ParamValue;
use crate::transfer::results::{TransferOutcome, UploadResult};
use crate::transfer::state::TransferState;
use crate::transport::{FormData, Transport, TransportRequest};

pub const DEFAULT_FILE_ALIAS: &str = "file";

/// What to upload and where to send it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Endpoint receiving the form
    pub url: String,
    /// Source file, e.g. `file:///storage/emulated/0/well%20done.txt`
    pub file_uri: String,
    /// Form field name of the file part
    pub file_alias: String,
    /// Extra scalar form fields, sent before the file part
    pub params: BTreeMap<String, ParamValue>,
    /// Send credentials with the request
    pub with_credentials: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            file_uri: String::new(),
            file_alias: DEFAULT_FILE_ALIAS.to_string(),
            params: BTreeMap::new(),
            with_credentials: false,
        }
    }
}

impl UploadConfig {
    pub fn new(url: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_uri: file_uri.into(),
            ..Self::default()
        }
    }

    pub fn file_alias(mut self, alias: impl Into<String>) -> Self {
        self.file_alias = alias.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Field name of the file part, falling back to `file` when blank
    pub fn effective_alias(&self) -> &str {
        if self.file_alias.is_empty() {
            DEFAULT_FILE_ALIAS
        } else {
            &self.file_alias
        }
    }
}

fn validate(config: &UploadConfig) -> Result<(), TransferError> {
    if config.url.is_empty() {
        warn!("url is empty, nowhere to upload to");
        return Err(TransferError::NoUrl);
    }
    if config.file_uri.is_empty() {
        warn!("file uri is empty, nothing to upload to {}", config.url);
        return Err(TransferError::NoFilename);
    }
    Ok(())
}

/// Assemble the multipart body: extra params first, then the file part.
pub fn build_form(config: &UploadConfig, blob: Blob, file_name: &str) -> FormData {
    let mut form = FormData::new();
    for (name, value) in &config.params {
        form.append(name.as_str(), value);
    }
    form.append_file(config.effective_alias(), blob, file_name);
    form
}

/// A single upload operation.
pub struct Uploader<S: Storage, T: Transport> {
    config: UploadConfig,
    storage: Arc<S>,
    transport: Arc<T>,
    settings: TransferSettings,
    callbacks: TransferCallbacks<UploadResult>,
    cancel: CancelToken,
}

impl<S: Storage, T: Transport> Uploader<S, T> {
    pub fn new(config: UploadConfig, storage: Arc<S>, transport: Arc<T>) -> Self {
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

    pub fn with_callbacks(mut self, callbacks: TransferCallbacks<UploadResult>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Start the upload on the tokio runtime.
    pub fn upload(self) -> TransferHandle<UploadResult> {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        TransferHandle::new(cancel, task)
    }

    /// Drive the upload to its terminal outcome.
    pub async fn run(self) -> TransferOutcome<UploadResult> {
        let Uploader {
            config,
            storage,
            transport,
            settings,
            callbacks,
            cancel,
        } = self;

        let mut op = Operation::new("upload", callbacks, cancel, settings.stage_timeout());
        if op.cancel_requested() {
            return op.cancelled();
        }

        op.enter(TransferState::Validating);
        if let Err(e) = validate(&config) {
            return op.fail(e);
        }

        op.enter(TransferState::ResolvingLocation);
        let source_error = |source: StorageError| TransferError::SourceFile {
            uri: config.file_uri.clone(),
            source,
        };

        let entry = match op.suspend(storage.resolve_file(&config.file_uri)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => return op.fail(source_error(e)),
            Err(interrupt) => return op.interrupted(interrupt),
        };

        let metadata = match op.suspend(storage.metadata(&entry)).await {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => return op.fail(source_error(e)),
            Err(interrupt) => return op.interrupted(interrupt),
        };

        let file_type = file_type_of(&metadata.name);
        let mime_type = mime_type_for(file_type);
        if mime_type.is_empty() {
            info!("MIME type is not defined for file type: {}", file_type);
        }

        let bytes = match op.suspend(storage.read_bytes(&entry)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return op.fail(source_error(e)),
            Err(interrupt) => return op.interrupted(interrupt),
        };
        if bytes.len() as u64 != metadata.size {
            debug!(
                "{} changed size while reading: expected {} bytes, read {}",
                metadata.name,
                metadata.size,
                bytes.len()
            );
        }

        let form = build_form(&config, Blob::new(bytes, mime_type), &metadata.name);

        op.enter(TransferState::Exchanging);
        let request = TransportRequest::post(config.url.clone(), form)
            .with_credentials(config.with_credentials);
        match op.exchange(transport, request).await {
            Ok(Ok(response)) => {
                info!("upload finished: {}", metadata.name);
                op.succeed(UploadResult {
                    status: response.status,
                    body: response.body,
                })
            }
            Ok(Err(e)) => op.fail(TransferError::Upload(e)),
            Err(interrupt) => op.interrupted(interrupt),
        }
    }
}
