use crate::core::error::{ExecutionError, SubmitError};
use crate::core::pending::{self, InvocationId, PendingResult};
use crate::core::pool::Executor;
use std::sync::Arc;

/// Turns calls into deferred jobs on an [`Executor`].
///
/// Every successful [`intercept`](Interceptor::intercept) queues exactly one
/// job and hands back exactly one [`PendingResult`]; a rejected submission
/// queues nothing and returns the [`SubmitError`] immediately.
#[derive(Clone)]
pub struct Interceptor {
    executor: Arc<dyn Executor>,
}

impl Interceptor {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Interceptor { executor }
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// Submits `task` and returns without waiting for it to run.
    ///
    /// `task` already holds the target and the arguments; `method` is only used
    /// to label logs and the returned result.
    pub fn intercept<T, F>(
        &self,
        method: &'static str,
        task: F,
    ) -> Result<PendingResult<T>, SubmitError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ExecutionError> + Send + 'static,
    {
        let id = InvocationId::new();
        let (completion, pending) = pending::channel(id, method);

        log::debug!("Submitting invocation {} of `{}`", id, method);
        if let Err(err) = self.executor.execute(Box::new(move || completion.run(task))) {
            log::warn!("Invocation {} of `{}` was rejected: {}", id, method, err);
            return Err(err);
        }
        log::debug!("Invocation {} of `{}` submitted", id, method);

        Ok(pending)
    }
}
