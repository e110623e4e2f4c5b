//! filexfer - single file transfers between HTTP endpoints and local storage
//!
//! A [`Downloader`] fetches one resource with GET and saves it into
//! persistent storage; an [`Uploader`] reads one stored file and POSTs it as
//! a multipart form. Both report progress and exactly one terminal outcome
//! (success, failure with a stable [`ErrorCode`], or cancellation) through
//! callbacks and their returned [`TransferOutcome`].

pub mod config;
pub mod error;
pub mod mime;
pub mod storage;
pub mod transfer;
pub mod transport;
pub mod utils;

pub use config::TransferSettings;
pub use error::{ErrorCode, NetworkError, StorageError, TransferError};
pub use mime::{MimeTypeResolver, mime_type_for};
pub use storage::{LocalStorage, Storage};
pub use transfer::{
    CancelToken, DownloadConfig, Downloader, ParamValue, TransferCallbacks, TransferHandle,
    TransferOutcome, TransferState, UploadConfig, UploadResult, Uploader,
};
pub use transport::{HttpTransport, ProgressInfo, Transport};
