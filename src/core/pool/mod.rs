//! Fixed-size worker pool.
//!
//! - [`Executor`] is the seam the interceptor submits through
//! - [`WorkerPool`] is the thread pool implementation behind it
//! - [`global`] holds the process-wide default pool

pub mod global;

use crate::core::config::PoolConfig;
use crate::core::error::{PoolError, SubmitError};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

/// A deferred unit of work. Returns `true` when the wrapped call succeeded.
pub type Job = Box<dyn FnOnce() -> bool + Send + 'static>;

/// Anything that accepts deferred jobs and runs them later.
pub trait Executor: Send + Sync {
    /// Queues `job` for execution, or rejects it synchronously.
    fn execute(&self, job: Job) -> Result<(), SubmitError>;
}

enum JobSender {
    Unbounded(Sender<Job>),
    Bounded {
        sender: SyncSender<Job>,
        capacity: usize,
    },
}

impl JobSender {
    fn send(&self, job: Job) -> Result<(), SubmitError> {
        match self {
            JobSender::Unbounded(sender) => sender.send(job).map_err(|_| SubmitError::ShutDown),
            JobSender::Bounded { sender, capacity } => match sender.try_send(job) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(SubmitError::Saturated {
                    capacity: *capacity,
                }),
                Err(TrySendError::Disconnected(_)) => Err(SubmitError::ShutDown),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicUsize,
    rejected: AtomicUsize,
    queued: AtomicUsize,
    active: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Point-in-time snapshot of a pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub workers: usize,
    pub submitted: usize,
    pub rejected: usize,
    pub queued: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

struct PoolInner {
    config: PoolConfig,
    sender: RwLock<Option<JobSender>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

/// A fixed set of worker threads pulling jobs from one FIFO queue.
///
/// `WorkerPool` is a cheap, cloneable handle. Jobs start in submission order;
/// completion order is unconstrained. The pool drains and joins its workers on
/// [`shutdown`](WorkerPool::shutdown), or when the last handle is dropped.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Validates `config` and spawns all worker threads up front.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let (sender, receiver): (JobSender, Receiver<Job>) = match config.queue_capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::sync_channel(capacity);
                (
                    JobSender::Bounded {
                        sender: tx,
                        capacity,
                    },
                    rx,
                )
            }
            None => {
                let (tx, rx) = mpsc::channel();
                (JobSender::Unbounded(tx), rx)
            }
        };

        let receiver = Arc::new(Mutex::new(receiver));
        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(config.workers);

        for index in 0..config.workers {
            let receiver = Arc::clone(&receiver);
            let counters = Arc::clone(&counters);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name, index))
                .spawn(move || worker_loop(receiver, counters));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    log::error!("Failed to spawn worker {}: {}", index, err);
                    // Closing the queue lets the workers already spawned exit.
                    drop(sender);
                    join_all(workers);
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        log::debug!(
            "Started worker pool '{}' with {} workers",
            config.thread_name,
            config.workers
        );

        Ok(WorkerPool {
            inner: Arc::new(PoolInner {
                config,
                sender: RwLock::new(Some(sender)),
                workers: Mutex::new(workers),
                counters,
            }),
        })
    }

    /// Builds a pool with [`PoolConfig::default`] (10 workers, unbounded queue).
    pub fn with_defaults() -> Result<Self, PoolError> {
        Self::new(PoolConfig::default())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn worker_count(&self) -> usize {
        self.inner.config.workers
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn stats(&self) -> PoolStats {
        let c = &self.inner.counters;
        PoolStats {
            workers: self.inner.config.workers,
            submitted: c.submitted.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            queued: c.queued.load(Ordering::Relaxed),
            active: c.active.load(Ordering::Relaxed),
            completed: c.completed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    /// Stops accepting jobs, runs everything already queued, then joins every worker.
    ///
    /// Calling it again is a no-op. When called from one of this pool's own
    /// workers, that worker is not joined.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl PoolInner {
    fn shutdown(&self) {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        log::debug!(
            "Shutting down worker pool '{}', draining {} queued jobs",
            self.config.thread_name,
            self.counters.queued.load(Ordering::Relaxed)
        );
        join_all(workers);
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) -> Result<(), SubmitError> {
        let guard = self
            .inner
            .sender
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counters = &self.inner.counters;

        let Some(sender) = guard.as_ref() else {
            counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(SubmitError::ShutDown);
        };

        // Counted before sending so a fast worker never decrements below zero.
        counters.queued.fetch_add(1, Ordering::Relaxed);
        match sender.send(job) {
            Ok(()) => {
                counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                counters.queued.fetch_sub(1, Ordering::Relaxed);
                counters.rejected.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Worker pool '{}' rejected a job: {}",
                    self.inner.config.thread_name,
                    err
                );
                Err(err)
            }
        }
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>, counters: Arc<Counters>) {
    loop {
        // The lock is released before the job runs so other workers can pull.
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();

        let Ok(job) = next else {
            break;
        };

        counters.queued.fetch_sub(1, Ordering::Relaxed);
        counters.active.fetch_add(1, Ordering::Relaxed);
        // Jobs may come straight through `Executor::execute`; a panic must not take the worker down.
        let succeeded = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(succeeded) => succeeded,
            Err(_) => {
                log::error!(
                    "A job panicked on worker {}",
                    thread::current().name().unwrap_or("<unnamed>")
                );
                false
            }
        };
        counters.active.fetch_sub(1, Ordering::Relaxed);

        if succeeded {
            counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn join_all(workers: Vec<JoinHandle<()>>) {
    let current = thread::current().id();
    for handle in workers {
        if handle.thread().id() == current {
            continue;
        }
        if handle.join().is_err() {
            log::error!("A worker thread terminated with a panic");
        }
    }
}
