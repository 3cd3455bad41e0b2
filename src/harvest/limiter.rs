//! Per-host politeness gate
//!
//! The limiter enforces a minimum interval between the *starts* of two
//! dispatches to the same host. Hosts are independent; the global in-flight
//! ceiling is the batch scheduler's concern.
//!
//! Each host owns an async mutex that is held while the caller waits out the
//! interval and records its dispatch time. Tokio's mutex is FIFO-fair, so
//! contending callers for one host proceed one at a time in arrival order.

use crate::state::HostState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Minimum-interval gate keyed by host
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    hosts: Mutex<HashMap<String, Arc<AsyncMutex<HostState>>>>,
}

impl RateLimiter {
    /// Creates a limiter with the given per-host interval
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// The configured per-host interval
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until `host` may be dispatched to, then records the dispatch
    ///
    /// Returns the instant recorded as this dispatch's start.
    pub async fn acquire(&self, host: &str) -> Instant {
        let slot = self.slot(host);
        let mut state = slot.lock().await;

        if let Some(wait) = state.time_until_next_dispatch(self.delay, Instant::now()) {
            tracing::trace!("Waiting {:?} before next dispatch to {}", wait, host);
            tokio::time::sleep(wait).await;
        }

        let now = Instant::now();
        state.record_dispatch(now);
        now
    }

    /// Number of hosts seen so far in this run
    pub fn host_count(&self) -> usize {
        self.lock_hosts().len()
    }

    /// Number of dispatches recorded for `host`
    pub async fn dispatch_count(&self, host: &str) -> u64 {
        let slot = self.lock_hosts().get(host).cloned();
        match slot {
            Some(slot) => slot.lock().await.dispatch_count,
            None => 0,
        }
    }

    /// Finds or creates the per-host slot; the map lock is never held across an await
    fn slot(&self, host: &str) -> Arc<AsyncMutex<HostState>> {
        let mut hosts = self.lock_hosts();
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(HostState::new()))),
        )
    }

    fn lock_hosts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<HostState>>>> {
        // Poisoning is ignored; entries are only ever inserted.
        self.hosts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(DELAY);
        let start = Instant::now();

        let dispatched = limiter.acquire("example.com").await;

        assert_eq!(dispatched, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_acquires_are_spaced() {
        let limiter = RateLimiter::new(DELAY);

        let first = limiter.acquire("example.com").await;
        let second = limiter.acquire("example.com").await;
        let third = limiter.acquire("example.com").await;

        assert!(second - first >= DELAY);
        assert!(third - second >= DELAY);
        assert_eq!(limiter.dispatch_count("example.com").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_measured_from_dispatch_start() {
        let limiter = RateLimiter::new(DELAY);

        let first = limiter.acquire("example.com").await;
        // Simulates a slow request that outlasts the interval.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let second = limiter.acquire("example.com").await;

        assert_eq!(second - first, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_are_independent() {
        let limiter = RateLimiter::new(DELAY);
        let start = Instant::now();

        let a = limiter.acquire("a.example.com").await;
        let b = limiter.acquire("b.example.com").await;

        assert_eq!(a, start);
        assert_eq!(b, start);
        assert_eq!(limiter.host_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_respect_interval() {
        let limiter = Arc::new(RateLimiter::new(DELAY));
        let mut handles = Vec::new();

        for _ in 0..5 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(
                async move { limiter.acquire("example.com").await },
            ));
        }

        let mut dispatches = Vec::new();
        for handle in handles {
            dispatches.push(handle.await.unwrap());
        }
        dispatches.sort();

        for pair in dispatches.windows(2) {
            assert!(pair[1] - pair[0] >= DELAY, "gap {:?} too small", pair[1] - pair[0]);
        }
        assert_eq!(limiter.dispatch_count("example.com").await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_does_not_wait() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();

        for _ in 0..3 {
            assert_eq!(limiter.acquire("example.com").await, start);
        }
    }

    #[tokio::test]
    async fn test_unknown_host_has_no_dispatches() {
        let limiter = RateLimiter::new(DELAY);
        assert_eq!(limiter.dispatch_count("nowhere.example").await, 0);
        assert_eq!(limiter.host_count(), 0);
    }
}
