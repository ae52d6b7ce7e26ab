use crate::core::error::{BoxError, ExecutionError, ProxyError, SubmitError};
use crate::core::interceptor::Interceptor;
use crate::core::pending::PendingResult;
use crate::core::pool::{Executor, WorkerPool, global};
use std::any::{Any, type_name};
use std::sync::Arc;

/// A stand-in for `T` whose calls run on a worker pool.
///
/// The proxy shares the target through an `Arc`; every call clones that `Arc`
/// into the deferred job, so the target outlives any task still using it.
/// `T` may be unsized, so `AsyncProxy<dyn MyTrait>` works.
///
/// Calls go through [`call`](AsyncProxy::call) and
/// [`try_call`](AsyncProxy::try_call), or through the per-trait methods
/// generated by [`async_capability!`](crate::async_capability).
pub struct AsyncProxy<T: ?Sized> {
    target: Arc<T>,
    interceptor: Interceptor,
}

impl<T: ?Sized> Clone for AsyncProxy<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            interceptor: self.interceptor.clone(),
        }
    }
}

impl<T> AsyncProxy<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Binds `target` to the process-wide pool, creating the pool if needed.
    pub fn new(target: Arc<T>) -> Result<Self, ProxyError> {
        let pool = global::global()?;
        Ok(Self::with_pool(target, &pool))
    }

    /// Binds `target` to a specific pool.
    pub fn with_pool(target: Arc<T>, pool: &WorkerPool) -> Self {
        Self::with_executor(target, Arc::new(pool.clone()))
    }

    pub fn with_executor(target: Arc<T>, executor: Arc<dyn Executor>) -> Self {
        Self::with_interceptor(target, Interceptor::new(executor))
    }

    pub fn with_interceptor(target: Arc<T>, interceptor: Interceptor) -> Self {
        AsyncProxy {
            target,
            interceptor,
        }
    }

    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    /// Runs `f` against the target on the pool.
    ///
    /// A panic inside `f` is reported as [`ExecutionError::Panicked`] when the
    /// result is read.
    pub fn call<R, F>(&self, method: &'static str, f: F) -> Result<PendingResult<R>, SubmitError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> R + Send + 'static,
    {
        let target = Arc::clone(&self.target);
        self.interceptor.intercept(method, move || Ok(f(&*target)))
    }

    /// Like [`call`](AsyncProxy::call) for methods returning `Result`; an `Err`
    /// becomes [`ExecutionError::Failed`] with the original error as its source.
    pub fn try_call<R, E, F>(
        &self,
        method: &'static str,
        f: F,
    ) -> Result<PendingResult<R>, SubmitError>
    where
        R: Send + 'static,
        E: Into<BoxError>,
        F: FnOnce(&T) -> Result<R, E> + Send + 'static,
    {
        let target = Arc::clone(&self.target);
        self.interceptor
            .intercept(method, move || f(&*target).map_err(ExecutionError::failed))
    }
}

/// Builds proxies that share one interceptor.
#[derive(Clone)]
pub struct ProxyFactory {
    interceptor: Interceptor,
}

impl ProxyFactory {
    /// A factory whose proxies use the process-wide pool.
    pub fn global() -> Result<Self, ProxyError> {
        let pool = global::global()?;
        Ok(Self::with_pool(&pool))
    }

    pub fn with_pool(pool: &WorkerPool) -> Self {
        Self::with_executor(Arc::new(pool.clone()))
    }

    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        ProxyFactory {
            interceptor: Interceptor::new(executor),
        }
    }

    pub fn create<T>(&self, target: Arc<T>) -> AsyncProxy<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        AsyncProxy::with_interceptor(target, self.interceptor.clone())
    }

    /// Builds a proxy from a type-erased object.
    ///
    /// Fails with [`ProxyError::Construction`] when `target` is not a `T`.
    pub fn create_from_any<T>(
        &self,
        target: Arc<dyn Any + Send + Sync>,
    ) -> Result<AsyncProxy<T>, ProxyError>
    where
        T: Any + Send + Sync,
    {
        let target = target.downcast::<T>().map_err(|_| ProxyError::Construction {
            expected: type_name::<T>(),
        })?;
        Ok(self.create(target))
    }
}
