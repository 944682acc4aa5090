//! Outbound request throttling, one ceiling per upstream host.
//!
//! Requests over the ceiling are not rejected: each caller reserves the next
//! free slot (spaced `1s / rps` apart) and sleeps until it comes up, so the
//! queue drains at the configured rate in arrival order.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug)]
pub struct Throttle {
    requests_per_second: NonZeroU32,
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(requests_per_second: NonZeroU32) -> Self {
        Self {
            requests_per_second,
            interval: Duration::from_secs(1) / requests_per_second.get(),
            next_slot: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn requests_per_second(&self) -> u32 {
        self.requests_per_second.get()
    }

    /// Reserve a slot without waiting; returns how long the caller must wait.
    pub fn reserve(&self) -> Duration {
        let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let slot = next.map_or(now, |n| n.max(now));
        *next = Some(slot + self.interval);
        slot.saturating_duration_since(now)
    }

    /// Block until this caller's slot comes up.
    pub fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
            debug!(rps = self.requests_per_second.get(), wait_ms, "throttled");
            thread::sleep(wait);
        }
    }
}

/// Process-wide throttles keyed by upstream host.
///
/// Clients talking to the same host share one `Throttle`; the first
/// registration for a host fixes its ceiling.
#[derive(Debug, Default)]
pub struct ThrottleRegistry {
    hosts: Mutex<HashMap<String, Arc<Throttle>>>,
}

impl ThrottleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_host(&self, host: &str, requests_per_second: NonZeroU32) -> Arc<Throttle> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Throttle::new(requests_per_second)))
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rps(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn requests_over_ceiling_spread_across_seconds() {
        let throttle = Throttle::new(rps(5));
        let start = Instant::now();

        let mut finished = Vec::new();
        for _ in 0..11 {
            throttle.acquire();
            finished.push(start.elapsed());
        }

        // ceil(11 / 5) = 3 distinct seconds.
        let seconds: HashSet<u64> = finished.iter().map(|d| d.as_secs()).collect();
        assert!(seconds.len() >= 3, "completions in seconds {seconds:?}");
        assert!(finished.iter().any(|d| d.as_secs() >= 1));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn first_request_is_not_delayed() {
        let throttle = Throttle::new(rps(1));
        assert_eq!(throttle.reserve(), Duration::ZERO);
        assert!(throttle.reserve() > Duration::from_millis(900));
    }

    #[test]
    fn concurrent_callers_share_one_ceiling() {
        let throttle = Arc::new(Throttle::new(rps(10)));
        let start = Instant::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let throttle = Arc::clone(&throttle);
                thread::spawn(move || throttle.acquire())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Ten slots 100ms apart: the last one opens 900ms after the first.
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[test]
    fn registry_shares_throttle_per_host() {
        let registry = ThrottleRegistry::new();
        let a = registry.for_host("game-api.example", rps(100));
        let b = registry.for_host("game-api.example", rps(3));
        let c = registry.for_host("server.example", rps(50));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.requests_per_second(), 100);
        assert_eq!(c.requests_per_second(), 50);
        assert_eq!(registry.len(), 2);
    }
}
