use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Number of workers in a pool built from [`PoolConfig::default`].
pub const DEFAULT_WORKERS: usize = 10;

/// Thread name prefix used when none is configured.
pub const DEFAULT_THREAD_NAME: &str = "offload-worker";

pub const ENV_WORKERS: &str = "OFFLOAD_WORKERS";
pub const ENV_QUEUE_CAPACITY: &str = "OFFLOAD_QUEUE_CAPACITY";
pub const ENV_THREAD_NAME: &str = "OFFLOAD_THREAD_NAME";

/// Configuration for a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Fixed number of worker threads.
    pub workers: usize,
    /// Maximum number of queued (not yet running) tasks. `None` means unbounded.
    pub queue_capacity: Option<usize>,
    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(self, workers: usize) -> Self {
        PoolConfig { workers, ..self }
    }

    pub fn with_queue_capacity(self, capacity: usize) -> Self {
        PoolConfig {
            queue_capacity: Some(capacity),
            ..self
        }
    }

    pub fn with_thread_name(self, name: impl Into<String>) -> Self {
        PoolConfig {
            thread_name: name.into(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }

    /// Builds a config from the `OFFLOAD_*` environment variables, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PoolConfig::default();

        if let Some(raw) = lookup(ENV_WORKERS) {
            config.workers = parse_usize(ENV_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = Some(parse_usize(ENV_QUEUE_CAPACITY, &raw)?);
        }
        if let Some(raw) = lookup(ENV_THREAD_NAME) {
            config.thread_name = raw;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: raw.to_string(),
    })
}
