//! Lifecycle of the process-wide pool.
//!
//! Everything lives in one test because the pool is shared by the whole test
//! binary and the steps depend on each other.

use offload::prelude::*;
use offload::{PoolError, init_global, is_global_initialized, shutdown_global};
use std::any::Any;
use std::sync::Arc;

struct Echo;

impl Echo {
    fn echo(&self, value: String) -> String {
        value
    }
}

#[test]
fn test_global_pool_lifecycle() {
    assert!(!is_global_initialized());

    let pool = init_global(PoolConfig::new().with_workers(3).with_thread_name("global"))
        .expect("first initialization succeeds");
    assert_eq!(pool.worker_count(), 3);
    assert!(is_global_initialized());

    // A second explicit initialization is refused.
    assert!(matches!(
        init_global(PoolConfig::default()),
        Err(PoolError::AlreadyInitialized)
    ));

    // Proxies built without an explicit pool share the global one.
    let proxy = AsyncProxy::new(Arc::new(Echo)).unwrap();
    let pending = proxy.call("echo", |e| e.echo("hello".to_string())).unwrap();
    assert_eq!(pending.get().unwrap(), "hello");

    let factory = ProxyFactory::global().unwrap();
    let erased: Arc<dyn Any + Send + Sync> = Arc::new(Echo);
    let from_any = factory.create_from_any::<Echo>(erased).unwrap();
    let pending = from_any.call("echo", |e| e.echo("again".to_string())).unwrap();
    assert_eq!(pending.get().unwrap(), "again");

    assert_eq!(offload::global().unwrap().stats().submitted, 2);

    shutdown_global();
    assert!(pool.is_shut_down());
    assert!(matches!(
        proxy.call("echo", |e| e.echo("late".to_string())),
        Err(SubmitError::ShutDown)
    ));
}
