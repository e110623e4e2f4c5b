//! Utility functions
//!
//! Provides logging setup and URI helpers.

pub mod logging;
pub mod uri;
