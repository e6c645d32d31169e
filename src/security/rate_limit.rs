//! Fixed-window rate limiting keyed by client identity and route.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::gateway::{ClientIdentity, Route};
use crate::observability::metrics;

/// Buckets idle for this many windows are purged.
const STALE_WINDOWS: u32 = 4;

/// How often (in `check` calls) the lazy purge runs.
const PURGE_EVERY: u64 = 1024;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Throttled { retry_after_secs: u64 },
}

/// Per-key counter for the current window.
struct Bucket {
    count: u32,
    window_start: Instant,
    window: Duration,
}

/// Fixed-window request counter.
///
/// The bucket map is the only shared mutable structure across concurrent
/// requests. `DashMap` shards by key, so increments for the same key
/// serialize while distinct keys never contend.
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Check and count one request for `(client, route)` under the route's
    /// limit. A request arriving exactly at the window boundary belongs to
    /// the new window.
    pub fn check(
        &self,
        client: &ClientIdentity,
        route: Route,
        limit: &RateLimitConfig,
    ) -> RateDecision {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_stale(Instant::now());
        }
        self.check_at(client, route, limit, Instant::now())
    }

    fn check_at(
        &self,
        client: &ClientIdentity,
        route: Route,
        limit: &RateLimitConfig,
        now: Instant,
    ) -> RateDecision {
        let key = format!("{}:{}", route.as_str(), client.as_str());
        let window = Duration::from_secs(limit.window_secs);

        // The entry guard holds the shard lock for the O(1) update only.
        match self.buckets.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(Bucket {
                    count: 1,
                    window_start: now,
                    window,
                });
                RateDecision::Allowed
            }
            Entry::Occupied(mut occupied) => {
                let bucket = occupied.get_mut();
                let elapsed = now.saturating_duration_since(bucket.window_start);
                if elapsed >= window {
                    bucket.count = 1;
                    bucket.window_start = now;
                    bucket.window = window;
                    return RateDecision::Allowed;
                }
                // Saturate: a flood of throttled replays within one window
                // must not wrap the counter back under the limit.
                bucket.count = bucket.count.saturating_add(1);
                if bucket.count > limit.max {
                    metrics::record_throttled(route.as_str());
                    RateDecision::Throttled {
                        retry_after_secs: remaining_secs(window, elapsed),
                    }
                } else {
                    RateDecision::Allowed
                }
            }
        }
    }

    /// Drop buckets that have been idle for several windows. Keeps the map
    /// bounded without a background task.
    fn purge_stale(&self, now: Instant) {
        self.buckets.retain(|_, bucket| {
            now.saturating_duration_since(bucket.window_start) < bucket.window * STALE_WINDOWS
        });
    }

    /// Number of live buckets. Exposed for tests.
    #[doc(hidden)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Remaining window time rounded up to whole seconds, at least 1.
fn remaining_secs(window: Duration, elapsed: Duration) -> u64 {
    let remaining = window.saturating_sub(elapsed);
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}
