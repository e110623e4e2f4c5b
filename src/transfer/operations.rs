//! Transfer operations
//!
//! Lifecycle core shared by downloads and uploads: stage transitions,
//! cancellation, stage timeouts, the in-flight transport handle, progress
//! relay, and exactly-once terminal dispatch.

use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, sleep};

use crate::error::handlers::handle_error;
use crate::error::{NetworkError, TransferError};
use crate::transfer::callbacks::TransferCallbacks;
use crate::transfer::results::TransferOutcome;
use crate::transfer::state::TransferState;
use crate::transport::{ProgressSender, Transport, TransportRequest, TransportResponse};

/// Cancellation request shared between an operation and its caller.
///
/// Cloning yields another handle to the same token. Cancelling is
/// idempotent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// The in-flight transport task of an operation.
///
/// Releasing aborts the task; releasing twice is harmless.
#[derive(Debug, Default)]
pub struct ActiveHandle {
    abort: Option<AbortHandle>,
}

impl ActiveHandle {
    fn attach(&mut self, abort: AbortHandle) {
        self.release();
        self.abort = Some(abort);
    }

    pub fn is_active(&self) -> bool {
        self.abort.is_some()
    }

    /// Abort the in-flight request, if any.
    pub fn release(&mut self) {
        if let Some(abort) = self.abort.take() {
            if !abort.is_finished() {
                debug!("Aborting in-flight request");
            }
            abort.abort();
        }
    }

    fn detach(&mut self) {
        self.abort = None;
    }
}

/// Why a suspended stage stopped waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Cancelled,
    TimedOut(TransferState),
}

/// Per-operation state owned exclusively by one download or upload.
pub(crate) struct Operation<R> {
    kind: &'static str,
    state: TransferState,
    callbacks: TransferCallbacks<R>,
    cancel: CancelToken,
    active: ActiveHandle,
    stage_timeout: Option<Duration>,
}

impl<R: Clone> Operation<R> {
    pub(crate) fn new(
        kind: &'static str,
        callbacks: TransferCallbacks<R>,
        cancel: CancelToken,
        stage_timeout: Option<Duration>,
    ) -> Self {
        Self {
            kind,
            state: TransferState::Created,
            callbacks,
            cancel,
            active: ActiveHandle::default(),
            stage_timeout,
        }
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn enter(&mut self, state: TransferState) {
        debug!("{}: {} -> {}", self.kind, self.state, state);
        self.state = state;
    }

    /// Wait for `fut`, giving up on cancellation or when the stage times out.
    pub(crate) async fn suspend<F: Future>(&mut self, fut: F) -> Result<F::Output, Interrupt> {
        let cancel = self.cancel.clone();
        let stage = self.state;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = expire(self.stage_timeout) => Err(Interrupt::TimedOut(stage)),
            output = fut => Ok(output),
        }
    }

    /// Run `request` on its own task, relaying progress until it completes.
    ///
    /// The task's abort handle is retained until completion so cancellation
    /// and timeouts abort the request. The stage timeout is an idle limit
    /// here: every progress event restarts it. Progress queued before
    /// completion is delivered before this returns.
    pub(crate) async fn exchange<T: Transport>(
        &mut self,
        transport: Arc<T>,
        request: TransportRequest,
    ) -> Result<Result<TransportResponse, NetworkError>, Interrupt> {
        let (progress, mut events) = ProgressSender::channel();
        let mut task: JoinHandle<Result<TransportResponse, NetworkError>> =
            tokio::spawn(async move { transport.send(request, progress).await });
        self.active.attach(task.abort_handle());

        let cancel = self.cancel.clone();
        let stage = self.state;
        let idle = self.stage_timeout;
        let deadline = sleep(idle.unwrap_or_default());
        tokio::pin!(deadline);

        let joined = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.active.release();
                    return Err(Interrupt::Cancelled);
                }
                _ = &mut deadline, if idle.is_some() => {
                    self.active.release();
                    return Err(Interrupt::TimedOut(stage));
                }
                Some(info) = events.recv() => {
                    if let Some(idle) = idle {
                        deadline.as_mut().reset(Instant::now() + idle);
                    }
                    self.callbacks.progress(info);
                }
                joined = &mut task => break joined,
            }
        };

        self.active.detach();
        while let Ok(info) = events.try_recv() {
            self.callbacks.progress(info);
        }

        match joined {
            Ok(result) => Ok(result),
            Err(e) if e.is_cancelled() => Ok(Err(NetworkError::Aborted)),
            Err(e) => Ok(Err(NetworkError::Connection(format!(
                "transport task failed: {}",
                e
            )))),
        }
    }

    fn finish(&mut self, state: TransferState) -> bool {
        if self.state.is_terminal() {
            warn!(
                "{}: ignoring {} after terminal state {}",
                self.kind, state, self.state
            );
            return false;
        }
        if self.active.is_active() {
            debug!("{}: {} releases the in-flight request", self.kind, state);
        }
        self.active.release();
        self.enter(state);
        true
    }

    pub(crate) fn succeed(&mut self, result: R) -> TransferOutcome<R> {
        if self.finish(TransferState::Succeeded) {
            info!("{} success!", self.kind);
            self.callbacks.success(result.clone());
        }
        TransferOutcome::Succeeded(result)
    }

    pub(crate) fn fail(&mut self, error: TransferError) -> TransferOutcome<R> {
        if self.finish(TransferState::Failed) {
            handle_error(&error);
            self.callbacks.fail(&error);
        }
        TransferOutcome::Failed(error)
    }

    pub(crate) fn cancelled(&mut self) -> TransferOutcome<R> {
        if self.finish(TransferState::Cancelled) {
            info!("{} cancelled", self.kind);
            self.callbacks.cancel();
        }
        TransferOutcome::Cancelled
    }

    pub(crate) fn interrupted(&mut self, interrupt: Interrupt) -> TransferOutcome<R> {
        match interrupt {
            Interrupt::Cancelled => self.cancelled(),
            Interrupt::TimedOut(stage) => self.fail(TransferError::TimedOut(stage)),
        }
    }
}

impl<R> Drop for Operation<R> {
    fn drop(&mut self) {
        self.active.release();
    }
}

async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

/// Handle to a transfer running on the tokio runtime
pub struct TransferHandle<R> {
    cancel: CancelToken,
    task: JoinHandle<TransferOutcome<R>>,
}

impl<R> TransferHandle<R> {
    pub(crate) fn new(cancel: CancelToken, task: JoinHandle<TransferOutcome<R>>) -> Self {
        Self { cancel, task }
    }

    /// Request cancellation; the running operation reports `Cancelled`
    /// unless it already reached a terminal state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome.
    pub async fn join(self) -> TransferOutcome<R> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => TransferOutcome::Cancelled,
        }
    }
}
