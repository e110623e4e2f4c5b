//! Transfer callbacks
//!
//! Caller supplied notifications. Terminal callbacks are `FnOnce` and are
//! taken out when fired, so each can run at most once.

use crate::error::TransferError;
use crate::transport::ProgressInfo;

type ProgressFn = Box<dyn FnMut(ProgressInfo) + Send>;
type SuccessFn<R> = Box<dyn FnOnce(R) + Send>;
type FailFn = Box<dyn FnOnce(&TransferError) + Send>;
type CancelFn = Box<dyn FnOnce() + Send>;

/// Progress and terminal notifications of one operation.
///
/// Unset callbacks are no-ops.
pub struct TransferCallbacks<R> {
    on_progress: Option<ProgressFn>,
    on_success: Option<SuccessFn<R>>,
    on_fail: Option<FailFn>,
    on_cancel: Option<CancelFn>,
}

impl<R> Default for TransferCallbacks<R> {
    fn default() -> Self {
        Self {
            on_progress: None,
            on_success: None,
            on_fail: None,
            on_cancel: None,
        }
    }
}

impl<R> TransferCallbacks<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl FnMut(ProgressInfo) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(R) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl FnOnce(&TransferError) + Send + 'static) -> Self {
        self.on_fail = Some(Box::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub(crate) fn progress(&mut self, info: ProgressInfo) {
        if let Some(f) = self.on_progress.as_mut() {
            f(info);
        }
    }

    pub(crate) fn success(&mut self, result: R) {
        let f = self.on_success.take();
        self.clear();
        if let Some(f) = f {
            f(result);
        }
    }

    pub(crate) fn fail(&mut self, error: &TransferError) {
        let f = self.on_fail.take();
        self.clear();
        if let Some(f) = f {
            f(error);
        }
    }

    pub(crate) fn cancel(&mut self) {
        let f = self.on_cancel.take();
        self.clear();
        if let Some(f) = f {
            f();
        }
    }

    fn clear(&mut self) {
        self.on_progress = None;
        self.on_success = None;
        self.on_fail = None;
        self.on_cancel = None;
    }
}
