//! Error handling
//!
//! Defines the error code table and the error types of each collaborator.

pub mod handlers;
pub mod types;

pub use types::*;
