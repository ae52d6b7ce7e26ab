//! # Offload
//!
//! A transparent async-invocation facade: wrap any object behind a proxy whose
//! method calls run on a fixed worker pool and hand back a pending result
//! immediately.
//!
//! ## Features
//!
//! - **Non-blocking calls**: every proxied call queues exactly one job and returns a [`PendingResult`]
//! - **Deferred errors**: failures and panics inside the target are captured and only surface when the result is read
//! - **Trait adapters**: [`async_capability!`] mirrors a trait so the proxy exposes the same capability set
//! - **Explicit pool lifecycle**: a lazily created process-wide pool with [`init_global`] and [`shutdown_global`], or private pools
//! - **Runtime agnostic results**: block with [`PendingResult::get`], poll with [`PendingResult::try_get`], or `.await`
//!
//! ## Quick Start
//!
//! ```rust
//! use offload::prelude::*;
//! use std::sync::Arc;
//!
//! struct Adder;
//!
//! impl Adder {
//!     fn add(&self, a: i32, b: i32) -> i32 {
//!         a + b
//!     }
//! }
//!
//! let pool = WorkerPool::new(PoolConfig::new().with_workers(2)).unwrap();
//! let proxy = AsyncProxy::with_pool(Arc::new(Adder), &pool);
//!
//! let pending = proxy.call("add", |adder| adder.add(2, 3)).unwrap();
//! assert_eq!(pending.get().unwrap(), 5);
//!
//! pool.shutdown();
//! ```
//!
//! ## Module Organization
//!
//! - [`prelude`]: Commonly used types and traits (import with `use offload::prelude::*`)
//! - [`pool`]: The worker pool, the [`Executor`] seam and the process-wide pool

// ============================================================================
// Core Module
// ============================================================================

mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Proxy and interceptor
pub use crate::core::interceptor::Interceptor;
pub use crate::core::proxy::{AsyncProxy, ProxyFactory};

// Results
pub use crate::core::pending::{InvocationId, PendingResult, PendingState};

// Pool
pub use crate::core::config::PoolConfig;
pub use crate::core::pool::global::{global, init_global, is_global_initialized, shutdown_global};
pub use crate::core::pool::{Executor, Job, PoolStats, WorkerPool};

// Errors
pub use crate::core::error::{
    BoxError, ConfigError, ExecutionError, PoolError, ProxyError, SubmitError,
};

/// Worker pool building blocks and configuration constants.
pub mod pool {
    pub use crate::core::config::{
        DEFAULT_THREAD_NAME, DEFAULT_WORKERS, ENV_QUEUE_CAPACITY, ENV_THREAD_NAME, ENV_WORKERS,
        PoolConfig,
    };
    pub use crate::core::pool::global::{
        global, init_global, is_global_initialized, shutdown_global,
    };
    pub use crate::core::pool::{Executor, Job, PoolStats, WorkerPool};
}

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything needed to build and call proxies.
///
/// # Example
/// ```rust
/// use offload::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Proxy
        AsyncProxy,
        ExecutionError,
        // Pool
        Executor,
        Interceptor,
        PendingResult,
        PendingState,
        PoolConfig,
        ProxyError,
        ProxyFactory,
        SubmitError,
        WorkerPool,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
