//! Transfer module
//!
//! Single-resource transfers between an HTTP endpoint and persistent
//! storage. [`Downloader`] and [`Uploader`] share one lifecycle core that
//! sequences validation, resolution, network exchange and persistence, and
//! reports exactly one terminal outcome.

pub mod callbacks;
pub mod download;
pub mod operations;
pub mod params;
pub mod results;
pub mod state;
pub mod upload;

// Re-export key types
pub use callbacks::TransferCallbacks;
pub use download::{DownloadConfig, Downloader};
pub use operations::{ActiveHandle, CancelToken, TransferHandle};
pub use params::ParamValue;
pub use results::{TransferOutcome, UploadResult};
pub use state::TransferState;
pub use upload::{DEFAULT_FILE_ALIAS, UploadConfig, Uploader, build_form};
