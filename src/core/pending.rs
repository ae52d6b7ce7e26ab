//! The result container handed back by every proxied call.
//!
//! A [`PendingResult`] is created together with its [`Completion`], the
//! worker-side half. The completion runs the deferred task exactly once and
//! publishes its outcome; the pending result reads it, blocking, polling or
//! awaiting as the caller prefers.

use crate::core::error::ExecutionError;
use futures::channel::oneshot;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use uuid::Uuid;

/// Unique identity of a single intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        InvocationId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle of a submitted task: `Submitted -> Running -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Submitted,
    Running,
    Completed,
    Failed,
}

impl PendingState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PendingState::Completed | PendingState::Failed)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => PendingState::Submitted,
            1 => PendingState::Running,
            2 => PendingState::Completed,
            _ => PendingState::Failed,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        StateCell(AtomicU8::new(PendingState::Submitted as u8))
    }

    fn get(&self) -> PendingState {
        PendingState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: PendingState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

type Outcome<T> = Result<T, ExecutionError>;

/// Creates a linked completion / pending result pair for one invocation.
pub(crate) fn channel<T>(
    id: InvocationId,
    method: &'static str,
) -> (Completion<T>, PendingResult<T>) {
    let (sender, receiver) = oneshot::channel();
    let state = Arc::new(StateCell::new());
    let completion = Completion {
        id,
        method,
        state: Arc::clone(&state),
        sender,
    };
    let pending = PendingResult {
        id,
        method,
        state,
        receiver,
        consumed: false,
    };
    (completion, pending)
}

/// Worker-side half: runs the task and publishes its outcome.
pub(crate) struct Completion<T> {
    id: InvocationId,
    method: &'static str,
    state: Arc<StateCell>,
    sender: oneshot::Sender<Outcome<T>>,
}

impl<T> Completion<T> {
    /// Runs `task` once, capturing both returned errors and panics.
    /// Returns `true` when the task completed successfully.
    pub(crate) fn run<F>(self, task: F) -> bool
    where
        F: FnOnce() -> Outcome<T>,
    {
        self.state.set(PendingState::Running);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!(
                    "Invocation {} of `{}` panicked: {}",
                    self.id,
                    self.method,
                    message
                );
                Err(ExecutionError::Panicked(message))
            }
        };

        let succeeded = outcome.is_ok();
        // Terminal state first: once a reader sees the outcome, `state()` agrees with it.
        self.state.set(if succeeded {
            PendingState::Completed
        } else {
            PendingState::Failed
        });
        // The caller may have dropped its PendingResult; the outcome is simply discarded then.
        let _ = self.sender.send(outcome);
        log::debug!(
            "Invocation {} of `{}` finished (success: {})",
            self.id,
            self.method,
            succeeded
        );
        succeeded
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle to a proxied call that may still be running.
///
/// Returned immediately by every intercepted call. The value, or the error
/// captured while running, is only observed when the caller reads it:
///
/// * [`get`](PendingResult::get) blocks the current thread,
/// * [`try_get`](PendingResult::try_get) polls without blocking,
/// * `.await` works from any async runtime,
/// * [`wait_timeout`](PendingResult::wait_timeout) awaits with a tokio deadline.
///
/// Dropping a `PendingResult` does not cancel the task.
pub struct PendingResult<T> {
    id: InvocationId,
    method: &'static str,
    state: Arc<StateCell>,
    receiver: oneshot::Receiver<Outcome<T>>,
    consumed: bool,
}

impl<T> PendingResult<T> {
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Name of the proxied method this result belongs to.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Current lifecycle state. It turns terminal just before the outcome is
    /// published, so `is_done()` may briefly be true while `try_get` still
    /// returns `None`; never the other way round.
    pub fn state(&self) -> PendingState {
        self.state.get()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Blocks until the task has finished and returns its outcome.
    ///
    /// Do not call this from a task running on the same pool with every worker
    /// busy: the result can never arrive.
    pub fn get(self) -> Outcome<T> {
        futures::executor::block_on(self)
    }

    /// Returns the outcome if it is already available, without blocking.
    ///
    /// Returns `None` while the task is pending, and also once the outcome has
    /// been taken by a previous call.
    pub fn try_get(&mut self) -> Option<Outcome<T>> {
        if self.consumed {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return None,
            Err(oneshot::Canceled) => Err(ExecutionError::Lost),
        };
        self.consumed = true;
        Some(outcome)
    }

    /// Awaits the outcome, giving up with [`ExecutionError::TimedOut`] after `timeout`.
    ///
    /// Must run inside a tokio runtime with the time driver enabled. The task
    /// itself keeps running when the deadline passes.
    pub async fn wait_timeout(self, timeout: Duration) -> Outcome<T> {
        match tokio::time::timeout(timeout, self).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ExecutionError::TimedOut),
        }
    }
}

impl<T> Future for PendingResult<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.consumed {
            return Poll::Ready(Err(ExecutionError::Lost));
        }
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(result) => {
                this.consumed = true;
                Poll::Ready(result.unwrap_or(Err(ExecutionError::Lost)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for PendingResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResult")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("state", &self.state())
            .finish()
    }
}
