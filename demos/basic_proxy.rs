//! A complete example showing how to offload calls on a service through a proxy.
//!
//! This example demonstrates:
//! - Declaring the async mirror of a trait with `async_capability!`
//! - Calling through the proxy without blocking
//! - Reading results, including a failure captured on a worker
//! - Shutting the pool down explicitly

use offload::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// Step 1: The capability set
// ============================================================================

#[derive(Debug, Error)]
#[error("report {0} does not exist")]
struct MissingReport(u32);

/// A slow reporting service.
trait Reports: Send + Sync {
    fn render(&self, id: u32) -> String;
    fn lookup(&self, id: u32) -> Result<String, MissingReport>;
}

offload::async_capability! {
    /// The same service, one pending result per call.
    trait ReportsAsync: Reports {
        fn render(&self, id: u32) -> String;
        fn lookup(&self, id: u32) -> String | MissingReport;
    }
}

// ============================================================================
// Step 2: The real implementation
// ============================================================================

struct ReportService;

impl Reports for ReportService {
    fn render(&self, id: u32) -> String {
        // Pretend this is expensive
        thread::sleep(Duration::from_millis(100));
        format!("<report #{}>", id)
    }

    fn lookup(&self, id: u32) -> Result<String, MissingReport> {
        if id < 100 {
            Ok(format!("report-{}", id))
        } else {
            Err(MissingReport(id))
        }
    }
}

// ============================================================================
// Step 3: Run it
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pool = WorkerPool::new(PoolConfig::new().with_workers(4))?;
    let proxy = AsyncProxy::with_pool(Arc::new(ReportService), &pool);

    let started = Instant::now();
    let pending: Vec<_> = (1..=8)
        .map(|id| proxy.render(id))
        .collect::<Result<_, _>>()?;
    println!(
        "[main] submitted {} renders in {:?}",
        pending.len(),
        started.elapsed()
    );

    for result in pending {
        println!("[main] {}", result.get()?);
    }
    println!("[main] all renders done after {:?}", started.elapsed());

    match proxy.lookup(404)?.get() {
        Ok(report) => println!("[main] found {}", report),
        Err(err) => println!("[main] lookup failed: {}", err),
    }

    pool.shutdown();
    println!("[main] pool stats: {}", serde_json::to_string(&pool.stats())?);
    Ok(())
}
