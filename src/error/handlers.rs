//! Error handlers
//!
//! Maps transfer failures onto the stable code table and logs them.

use crate::error::types::{ErrorCode, TransferError};
use log::error;

/// Log a transfer failure
pub fn handle_error(err: &TransferError) {
    error!("Transfer error [{}]: {}", err.code(), err);
}

/// Convert a transfer failure to its stable error code
pub fn error_to_code(err: &TransferError) -> ErrorCode {
    match err {
        TransferError::NoUrl => ErrorCode::NoUrl,
        TransferError::NoFilename => ErrorCode::NoFilename,
        TransferError::FileSystem(_) => ErrorCode::FileSystemError,
        TransferError::LocalFileSystem { .. } => ErrorCode::LocalFileSystemError,
        TransferError::HttpStatus(_) => ErrorCode::XhrStatusError,
        TransferError::Network(_) => ErrorCode::XhrStatusError,
        TransferError::SaveFile { .. } => ErrorCode::SaveFileError,
        TransferError::WriteFile { .. } => ErrorCode::WriteFileError,
        TransferError::Upload(_) => ErrorCode::UploadError,
        TransferError::SourceFile { .. } => ErrorCode::SourceFileError,
        TransferError::TimedOut(_) => ErrorCode::TimedOut,
    }
}
