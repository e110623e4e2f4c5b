//! Transfer result types
//!
//! Defines the terminal outcome returned by every transfer operation.

use crate::error::{ErrorCode, TransferError};

/// Terminal outcome of a transfer operation
#[derive(Debug)]
pub enum TransferOutcome<R> {
    Succeeded(R),
    Failed(TransferError),
    Cancelled,
}

impl<R> TransferOutcome<R> {
    /// Stable code of this outcome: `Success`, `Cancelled` or the failure code
    pub fn code(&self) -> ErrorCode {
        match self {
            TransferOutcome::Succeeded(_) => ErrorCode::Success,
            TransferOutcome::Failed(err) => err.code(),
            TransferOutcome::Cancelled => ErrorCode::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Succeeded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferOutcome::Cancelled)
    }

    /// The success value, if any
    pub fn ok(self) -> Option<R> {
        match self {
            TransferOutcome::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&TransferError> {
        match self {
            TransferOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Server reply to a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UploadResult {
    /// Reply body decoded as UTF-8, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
