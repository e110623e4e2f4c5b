//! Network transport
//!
//! The [`Transport`] trait is the boundary to the HTTP client. Transfer
//! operations spawn [`Transport::send`] on its own task and abort that task
//! to cancel the request. [`HttpTransport`] implements it with reqwest.

pub mod http;
pub mod results;

use async_trait::async_trait;

use crate::error::NetworkError;

pub use http::{Credentials, HttpTransport};
pub use results::{
    FilePart, FormData, Method, ProgressInfo, ProgressSender, TransportRequest,
    TransportResponse,
};

/// Network client consumed by transfer operations.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform `request`, reporting progress through `progress`.
    ///
    /// Any HTTP status counts as a completed exchange; only transport-level
    /// failures are errors.
    async fn send(
        &self,
        request: TransportRequest,
        progress: ProgressSender,
    ) -> Result<TransportResponse, NetworkError>;
}
