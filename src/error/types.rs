//! Error types
//!
//! Defines the stable transfer error codes and the domain-specific error
//! types raised by the storage and transport collaborators.

use std::fmt;
use std::io;

use crate::transfer::TransferState;

/// Stable numeric outcome codes reported to callers.
///
/// The numeric values are part of the public contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Cancelled,
    Success,
    NoUrl,
    NoFilename,
    FileSystemError,
    LocalFileSystemError,
    XhrStatusError,
    SaveFileError,
    WriteFileError,
    UploadError,
    SourceFileError,
    TimedOut,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::Cancelled,
        ErrorCode::Success,
        ErrorCode::NoUrl,
        ErrorCode::NoFilename,
        ErrorCode::FileSystemError,
        ErrorCode::LocalFileSystemError,
        ErrorCode::XhrStatusError,
        ErrorCode::SaveFileError,
        ErrorCode::WriteFileError,
        ErrorCode::UploadError,
        ErrorCode::SourceFileError,
        ErrorCode::TimedOut,
    ];

    /// Returns the stable numeric value of this code.
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::Cancelled => 0,
            ErrorCode::Success => 1,
            ErrorCode::NoUrl => -1,
            ErrorCode::NoFilename => -2,
            ErrorCode::FileSystemError => -3,
            ErrorCode::LocalFileSystemError => -4,
            ErrorCode::XhrStatusError => -5,
            ErrorCode::SaveFileError => -6,
            ErrorCode::WriteFileError => -7,
            ErrorCode::UploadError => -8,
            ErrorCode::SourceFileError => -9,
            ErrorCode::TimedOut => -10,
        }
    }

    /// Looks up a code by its numeric value.
    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_i32() == value)
    }

    /// Returns the symbolic name of this code, e.g. `NO_URL`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Cancelled => "CANCELED",
            ErrorCode::Success => "SUCCESS",
            ErrorCode::NoUrl => "NO_URL",
            ErrorCode::NoFilename => "NO_FILENAME",
            ErrorCode::FileSystemError => "FILE_SYSTEM_ERROR",
            ErrorCode::LocalFileSystemError => "LOCAL_FILE_SYSTEM_ERROR",
            ErrorCode::XhrStatusError => "XHR_STATUS_ERROR",
            ErrorCode::SaveFileError => "SAVE_FILE_ERROR",
            ErrorCode::WriteFileError => "WRITE_FILE_ERROR",
            ErrorCode::UploadError => "UPLOAD_ERROR",
            ErrorCode::SourceFileError => "SOURCE_FILE_ERROR",
            ErrorCode::TimedOut => "TIMED_OUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

/// Storage collaborator errors
#[derive(Debug)]
pub enum StorageError {
    FileNotFound(String),
    DirectoryNotFound(String),
    NotADirectory(String),
    InvalidPath(String),
    FileAlreadyExists(String),
    PermissionDenied(String),
    Unavailable(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FileNotFound(p) => write!(f, "File not found: {}", p),
            StorageError::DirectoryNotFound(p) => write!(f, "Directory not found: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::FileAlreadyExists(p) => write!(f, "File already exists: {}", p),
            StorageError::PermissionDenied(p) => write!(f, "Permission denied: {}", p),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(error.to_string()),
            _ => StorageError::IoError(error),
        }
    }
}

/// Transport collaborator errors
#[derive(Debug)]
pub enum NetworkError {
    InvalidUrl(String),
    RequestBuild(String),
    Connection(String),
    BodyRead(String),
    Aborted,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidUrl(u) => write!(f, "Invalid URL: {}", u),
            NetworkError::RequestBuild(msg) => write!(f, "Failed to build request: {}", msg),
            NetworkError::Connection(msg) => write!(f, "Connection failed: {}", msg),
            NetworkError::BodyRead(msg) => write!(f, "Failed to read response body: {}", msg),
            NetworkError::Aborted => write!(f, "Request aborted"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<reqwest::Error> for NetworkError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            NetworkError::RequestBuild(error.to_string())
        } else if error.is_body() || error.is_decode() {
            NetworkError::BodyRead(error.to_string())
        } else {
            NetworkError::Connection(error.to_string())
        }
    }
}

/// Terminal failure of a transfer operation.
///
/// Every variant maps to exactly one [`ErrorCode`]; the attached detail is
/// diagnostic only.
#[derive(Debug)]
pub enum TransferError {
    NoUrl,
    NoFilename,
    FileSystem(StorageError),
    LocalFileSystem { location: String, source: StorageError },
    HttpStatus(u16),
    Network(NetworkError),
    SaveFile { filename: String, source: StorageError },
    WriteFile { filename: String, source: StorageError },
    Upload(NetworkError),
    SourceFile { uri: String, source: StorageError },
    TimedOut(TransferState),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NoUrl => write!(f, "url is empty"),
            TransferError::NoFilename => write!(f, "filename is empty"),
            TransferError::FileSystem(e) => {
                write!(f, "Could not obtain default persistent root: {}", e)
            }
            TransferError::LocalFileSystem { location, source } => {
                write!(f, "Could not resolve save location {}: {}", location, source)
            }
            TransferError::HttpStatus(status) => {
                write!(f, "Download failed, status code: {}", status)
            }
            TransferError::Network(e) => write!(f, "Download failed: {}", e),
            TransferError::SaveFile { filename, source } => {
                write!(f, "Could not create file {}: {}", filename, source)
            }
            TransferError::WriteFile { filename, source } => {
                write!(f, "Failed file write {}: {}", filename, source)
            }
            TransferError::Upload(e) => write!(f, "Upload failed: {}", e),
            TransferError::SourceFile { uri, source } => {
                write!(f, "Could not read source file {}: {}", uri, source)
            }
            TransferError::TimedOut(stage) => write!(f, "Timed out while {}", stage),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::FileSystem(e) => Some(e),
            TransferError::LocalFileSystem { source, .. }
            | TransferError::SaveFile { source, .. }
            | TransferError::WriteFile { source, .. }
            | TransferError::SourceFile { source, .. } => Some(source),
            TransferError::Network(e) | TransferError::Upload(e) => Some(e),
            _ => None,
        }
    }
}

impl TransferError {
    /// Stable code for this failure.
    pub fn code(&self) -> ErrorCode {
        crate::error::handlers::error_to_code(self)
    }
}
