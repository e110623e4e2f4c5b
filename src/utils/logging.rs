//! Logging utilities
//!
//! Provides logging setup for applications embedding the transfer core.

/// Setup logging from `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Setup logging for tests, capturing output per test.
pub fn setup_test_logging() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}
