use thiserror::Error;

/// Boxed error returned by a fallible proxied method.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised synchronously when a proxy cannot be built for the requested capability set.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Target does not implement the requested capability set: expected {expected}")]
    Construction { expected: &'static str },

    #[error("Worker pool unavailable: {0}")]
    Pool(#[from] PoolError),
}

/// Raised synchronously to the caller of a proxied method when the pool refuses the task.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Worker pool queue is full (capacity {capacity})")]
    Saturated { capacity: usize },

    #[error("Worker pool has been shut down")]
    ShutDown,
}

/// Captured while the task runs on a worker, observed only when the result is read.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Invocation failed: {0}")]
    Failed(#[source] BoxError),

    #[error("Invocation panicked: {0}")]
    Panicked(String),

    #[error("Invocation was dropped before producing a result")]
    Lost,

    #[error("Timed out waiting for the invocation result")]
    TimedOut,
}

impl ExecutionError {
    /// Wraps any error returned by the target method.
    pub fn failed<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ExecutionError::Failed(err.into())
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("The global worker pool is already initialized")]
    AlreadyInitialized,

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Worker count must be greater than 0")]
    ZeroWorkers,

    #[error("Queue capacity must be greater than 0 when set")]
    ZeroQueueCapacity,

    #[error("Thread name must not be empty")]
    EmptyThreadName,

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
