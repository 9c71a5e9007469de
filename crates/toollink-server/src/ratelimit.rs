//! Fixed-window rate limiter for the credential endpoints.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How many tracked clients trigger a sweep of expired windows. Keys
/// come from an attacker-controlled header, so the map must not grow
/// without bound under spoofed traffic.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-client fixed-window counter. Window state lives in memory; a
/// restart resets all counters, which is acceptable for a login
/// throttle.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key`, returning whether it is allowed.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() >= PRUNE_THRESHOLD {
            buckets.retain(|_, (start, _)| now.duration_since(*start) < self.window);
        }

        let entry = buckets.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1 <= self.max_requests
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow("a"));
    }

    #[test]
    fn stale_keys_are_swept_once_the_map_fills() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        for i in 0..PRUNE_THRESHOLD {
            limiter.allow(&format!("10.0.{}.{}", i / 256, i % 256));
        }
        assert_eq!(limiter.tracked_clients(), PRUNE_THRESHOLD);

        // All windows expire; the next request triggers the sweep.
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow("fresh"));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
