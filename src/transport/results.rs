//! Transport request and response types

use std::fmt;
use tokio::sync::mpsc;

use crate::storage::Blob;
use crate::transfer::ParamValue;

/// HTTP method used by a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// File part of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub blob: Blob,
}

/// Multipart form body: scalar fields in insertion order plus one file part
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scalar field.
    pub fn append(&mut self, name: impl Into<String>, value: &ParamValue) {
        self.fields.push((name.into(), value.to_string()));
    }

    /// Set the file part.
    pub fn append_file(
        &mut self,
        field: impl Into<String>,
        blob: Blob,
        file_name: impl Into<String>,
    ) {
        self.file = Some(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            blob,
        });
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of the first field called `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn file(&self) -> Option<&FilePart> {
        self.file.as_ref()
    }

    pub fn into_parts(self) -> (Vec<(String, String)>, Option<FilePart>) {
        (self.fields, self.file)
    }
}

/// A single request issued by a transfer operation
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub with_credentials: bool,
    pub body: Option<FormData>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            with_credentials: false,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, form: FormData) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            with_credentials: false,
            body: Some(form),
        }
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }
}

/// Completed response: status code and raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Progress of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressInfo {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl ProgressInfo {
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// Whether the total size is known
    pub fn length_computable(&self) -> bool {
        self.total.is_some()
    }
}

/// Producer side of the progress channel handed to a transport.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressInfo>,
}

impl ProgressSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressInfo>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report progress. Events sent after the operation stopped listening
    /// are dropped.
    pub fn report(&self, loaded: u64, total: Option<u64>) {
        let _ = self.tx.send(ProgressInfo::new(loaded, total));
    }
}
