//! The process-wide default pool shared by every proxy built with
//! [`AsyncProxy::new`](crate::AsyncProxy::new).
//!
//! It is created on first use from [`PoolConfig::from_env`], or explicitly
//! with [`init_global`] before any proxy exists. [`shutdown_global`] drains
//! it; after that every submission through it fails with
//! [`SubmitError::ShutDown`](crate::SubmitError::ShutDown).

use crate::core::config::PoolConfig;
use crate::core::error::PoolError;
use crate::core::pool::WorkerPool;
use std::sync::{Mutex, OnceLock, PoisonError};

static GLOBAL: OnceLock<WorkerPool> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Returns the process-wide pool, creating it from the environment if needed.
pub fn global() -> Result<WorkerPool, PoolError> {
    if let Some(pool) = GLOBAL.get() {
        return Ok(pool.clone());
    }

    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = GLOBAL.get() {
        return Ok(pool.clone());
    }

    let pool = WorkerPool::new(PoolConfig::from_env()?)?;
    log::debug!("Initialized global worker pool from environment");
    Ok(GLOBAL.get_or_init(|| pool).clone())
}

/// Creates the process-wide pool with an explicit configuration.
///
/// Fails with [`PoolError::AlreadyInitialized`] once the pool exists, whether
/// it was created by an earlier call or lazily by [`global`].
pub fn init_global(config: PoolConfig) -> Result<WorkerPool, PoolError> {
    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if GLOBAL.get().is_some() {
        return Err(PoolError::AlreadyInitialized);
    }

    let pool = WorkerPool::new(config)?;
    Ok(GLOBAL.get_or_init(|| pool).clone())
}

/// Drains and stops the process-wide pool if it was ever created.
pub fn shutdown_global() {
    if let Some(pool) = GLOBAL.get() {
        pool.shutdown();
    }
}

/// Whether the process-wide pool has been created.
pub fn is_global_initialized() -> bool {
    GLOBAL.get().is_some()
}
