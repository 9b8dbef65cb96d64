//! Worker threads that hammer pools through their proxies.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use phoenix_swap::ForwardingProxy;

use crate::pool::Pool;

/// What the workers observed while they ran.
#[derive(Debug, Default)]
pub struct WorkerSummary {
    /// Successful checkouts.
    pub checkouts: u64,
    /// Checkouts that returned an error.
    pub errors: u64,
    /// Pool serials seen, across every pool.
    pub serials: BTreeSet<u64>,
    /// Times a worker saw an older serial after a newer one on the same pool.
    pub regressions: u64,
}

impl WorkerSummary {
    fn merge(&mut self, other: WorkerSummary) {
        self.checkouts += other.checkouts;
        self.errors += other.errors;
        self.serials.extend(other.serials);
        self.regressions += other.regressions;
    }
}

/// A set of running worker threads.
pub struct Workers {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<WorkerSummary>>,
}

impl Workers {
    /// Starts `per_pool` threads for each proxy.
    #[must_use]
    pub fn spawn(pools: &[ForwardingProxy<dyn Pool>], per_pool: usize) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(pools.len() * per_pool);

        for proxy in pools {
            for worker in 0..per_pool {
                let proxy = proxy.clone();
                let stop = Arc::clone(&stop);
                let client = format!("{}-worker-{worker}", proxy.name());
                threads.push(thread::spawn(move || run(&proxy, &client, &stop)));
            }
        }

        Self { stop, threads }
    }

    /// Stops every worker and merges what they saw.
    #[must_use]
    pub fn join(self) -> WorkerSummary {
        self.stop.store(true, Ordering::Relaxed);
        let mut summary = WorkerSummary::default();
        for thread in self.threads {
            match thread.join() {
                Ok(seen) => summary.merge(seen),
                Err(_) => tracing::error!("worker thread panicked"),
            }
        }
        summary
    }
}

fn run(proxy: &ForwardingProxy<dyn Pool>, client: &str, stop: &AtomicBool) -> WorkerSummary {
    let mut summary = WorkerSummary::default();
    let mut last_serial = None;

    while !stop.load(Ordering::Relaxed) {
        // One snapshot per iteration so serial and checkout hit the same pool.
        let pool = proxy.snapshot();
        let serial = pool.serial();
        if last_serial.is_some_and(|last| serial < last) {
            summary.regressions += 1;
        }
        last_serial = Some(serial);
        summary.serials.insert(serial);

        match pool.checkout(client) {
            Ok(_) => summary.checkouts += 1,
            Err(err) => {
                summary.errors += 1;
                tracing::debug!(client, %err, "checkout failed");
            }
        }
        thread::sleep(Duration::from_millis(1));
    }

    summary
}
