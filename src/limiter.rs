//! Outbound-call pacing for the Segment API.
//!
//! Port of the original integration's Bottleneck `{ minTime }` setup: a
//! minimum spacing between the *start* times of successive scheduled calls.
//! The limiter does not bound how many calls are in flight, only how fast
//! new ones are issued.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Serialises admission of outbound calls so that successive task starts are
/// at least `min_interval` apart.
///
/// Admission is FIFO (the tokio mutex queues waiters fairly) and tasks are
/// never dropped or reordered. Once a task has been admitted it runs
/// unconstrained; completions may overlap arbitrarily.
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Schedule `task`, delaying its start until the next free slot.
    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = {
            let mut slot = self.next_slot.lock().await;
            let now = Instant::now();
            let start = if *slot > now { *slot } else { now };
            *slot = start + self.min_interval;
            start
        };
        sleep_until(start).await;
        task().await
    }
}
