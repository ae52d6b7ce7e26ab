//! End-to-end behavior of proxied calls on a private worker pool.

use offload::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
enum CalcError {
    #[error("{0}")]
    IllegalState(String),
}

trait Calculator: Send + Sync {
    fn add(&self, a: i32, b: i32) -> i32;
    fn slow_add(&self, a: i32, b: i32, delay_ms: u64) -> i32;
    fn explode(&self) -> Result<i32, CalcError>;
}

offload::async_capability! {
    trait CalculatorAsync: Calculator {
        fn add(&self, a: i32, b: i32) -> i32;
        fn slow_add(&self, a: i32, b: i32, delay_ms: u64) -> i32;
        fn explode(&self) -> i32 | CalcError;
    }
}

#[derive(Default)]
struct CountingCalculator {
    calls: AtomicUsize,
}

impl Calculator for CountingCalculator {
    fn add(&self, a: i32, b: i32) -> i32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        a + b
    }

    fn slow_add(&self, a: i32, b: i32, delay_ms: u64) -> i32 {
        thread::sleep(Duration::from_millis(delay_ms));
        self.add(a, b)
    }

    fn explode(&self) -> Result<i32, CalcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CalcError::IllegalState("boom".to_string()))
    }
}

fn pool(workers: usize) -> WorkerPool {
    WorkerPool::new(PoolConfig::new().with_workers(workers)).unwrap()
}

#[test]
fn test_add_scenario() {
    let pool = pool(10);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    let pending = proxy.add(2, 3).unwrap();
    assert_eq!(pending.get().unwrap(), 5);
}

#[test]
fn test_boom_scenario_is_deferred() {
    let pool = pool(10);
    let target = Arc::new(CountingCalculator::default());
    let proxy = AsyncProxy::with_pool(Arc::clone(&target), &pool);

    // The call itself succeeds: the failure only exists inside the result.
    let pending = proxy.explode().unwrap();

    let err = pending.get().unwrap_err();
    assert!(err.to_string().contains("boom"));
    match err {
        ExecutionError::Failed(source) => {
            assert!(matches!(
                source.downcast_ref::<CalcError>(),
                Some(CalcError::IllegalState(msg)) if msg == "boom"
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(target.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_call_returns_before_body_finishes() {
    let pool = pool(10);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    let started = Instant::now();
    let pending = proxy.slow_add(1, 1, 300).unwrap();
    let returned_after = started.elapsed();

    assert!(returned_after < Duration::from_millis(300));
    assert!(!pending.is_done());
    assert_eq!(pending.get().unwrap(), 2);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[test]
fn test_exactly_once_for_n_calls() {
    let pool = pool(4);
    let target = Arc::new(CountingCalculator::default());
    let proxy = AsyncProxy::with_pool(Arc::clone(&target), &pool);

    const N: i32 = 200;
    let pending: Vec<_> = (0..N).map(|i| proxy.add(i, 1).unwrap()).collect();
    let sum: i32 = pending.into_iter().map(|p| p.get().unwrap()).sum();

    assert_eq!(sum, (1..=N).sum::<i32>());
    assert_eq!(target.calls.load(Ordering::SeqCst), N as usize);
}

#[test]
fn test_more_calls_than_workers_from_many_threads() {
    let pool = pool(3);
    let target = Arc::new(CountingCalculator::default());
    let proxy = AsyncProxy::with_pool(Arc::clone(&target), &pool);

    let callers: Vec<_> = (0..8)
        .map(|caller| {
            let proxy = proxy.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|i| proxy.slow_add(caller, i, 2).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut completed = 0;
    for caller in callers {
        for pending in caller.join().unwrap() {
            pending.get().unwrap();
            completed += 1;
        }
    }

    assert_eq!(completed, 80);
    assert_eq!(target.calls.load(Ordering::SeqCst), 80);

    pool.shutdown();
    let stats = pool.stats();
    assert_eq!(stats.submitted, 80);
    assert_eq!(stats.completed, 80);
    assert_eq!(stats.failed, 0);
}

#[test]
fn test_panicking_call_does_not_poison_pool() {
    let pool = pool(1);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    let bad = proxy
        .call("divide_by_zero", |_calc| -> i32 { panic!("attempt to divide by zero") })
        .unwrap();
    assert!(matches!(bad.get(), Err(ExecutionError::Panicked(msg)) if msg.contains("divide")));

    // The single worker is still alive.
    assert_eq!(proxy.add(40, 2).unwrap().get().unwrap(), 42);
    assert_eq!(pool.stats().failed, 1);
}

#[test]
fn test_raw_panicking_job_leaves_proxy_usable() {
    let pool = pool(1);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    pool.execute(Box::new(|| panic!("raw job panic"))).unwrap();

    assert_eq!(proxy.add(2, 3).unwrap().get().unwrap(), 5);
    assert!(!pool.is_shut_down());
    assert_eq!(pool.stats().failed, 1);
}

#[test]
fn test_bounded_pool_rejects_synchronously() {
    let pool = WorkerPool::new(PoolConfig::new().with_workers(1).with_queue_capacity(1)).unwrap();
    let target = Arc::new(CountingCalculator::default());
    let proxy = AsyncProxy::with_pool(Arc::clone(&target), &pool);

    let running = proxy.slow_add(0, 0, 200).unwrap();
    while running.state() == PendingState::Submitted {
        thread::yield_now();
    }
    let queued = proxy.add(1, 1).unwrap();

    let rejected = proxy.add(2, 2);
    assert_eq!(
        rejected.unwrap_err(),
        SubmitError::Saturated { capacity: 1 }
    );

    assert_eq!(running.get().unwrap(), 0);
    assert_eq!(queued.get().unwrap(), 2);
    // The rejected call never reached the target.
    assert_eq!(target.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shutdown_drains_pending_calls() {
    let pool = pool(2);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    let pending: Vec<_> = (0..10).map(|i| proxy.slow_add(i, 0, 5).unwrap()).collect();
    pool.shutdown();

    for (i, mut p) in pending.into_iter().enumerate() {
        assert!(p.is_done());
        assert_eq!(p.try_get().unwrap().unwrap(), i as i32);
    }
    assert_eq!(proxy.add(1, 1).unwrap_err(), SubmitError::ShutDown);
}

#[tokio::test]
async fn test_await_from_async_context() {
    let pool = pool(2);
    let proxy = AsyncProxy::with_pool(Arc::new(CountingCalculator::default()), &pool);

    let a = proxy.slow_add(1, 2, 20).unwrap();
    let b = proxy.add(3, 4).unwrap();
    let (a, b) = futures::join!(a, b);
    assert_eq!(a.unwrap() + b.unwrap(), 10);
}

#[tokio::test]
async fn test_wait_timeout_does_not_cancel() {
    let pool = pool(1);
    let target = Arc::new(CountingCalculator::default());
    let proxy = AsyncProxy::with_pool(Arc::clone(&target), &pool);

    let slow = proxy.slow_add(1, 1, 200).unwrap();
    let outcome = slow.wait_timeout(Duration::from_millis(10)).await;
    assert!(matches!(outcome, Err(ExecutionError::TimedOut)));

    // The task keeps running and the next call queues behind it.
    let after = proxy.add(0, 0).unwrap();
    assert_eq!(after.await.unwrap(), 0);
    assert_eq!(target.calls.load(Ordering::SeqCst), 2);
}
