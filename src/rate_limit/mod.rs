//! Per-key sliding-window rate limiter.
//!
//! Each key owns an ascending queue of admitted-request timestamps. A check
//! prunes entries that have aged out of the trailing window, compares the
//! remaining count against the quota and, only when admitting, records the
//! current instant. The whole prune-decide-append sequence runs under a single
//! mutex so concurrent checks for one key are linearizable.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Length of the trailing window
pub const WINDOW_SECS: i64 = 60;

fn window() -> Duration {
    Duration::seconds(WINDOW_SECS)
}

/// Outcome of a single check, carrying everything needed for the
/// `X-RateLimit-*` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix seconds of `window_start + WINDOW`
    pub reset: i64,
}

pub struct RateLimiter {
    requests: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
    default_limit: u32,
}

impl RateLimiter {
    pub fn new(default_limit: u32) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            default_limit: default_limit.max(1),
        }
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Check against the wall clock
    pub fn check(&self, key: &str, quota: Option<u32>) -> RateLimitDecision {
        self.check_at(key, quota, Utc::now())
    }

    /// Check as of `now`. `quota` of `None` or `0` uses the default limit.
    pub fn check_at(&self, key: &str, quota: Option<u32>, now: DateTime<Utc>) -> RateLimitDecision {
        let limit = quota.filter(|q| *q > 0).unwrap_or(self.default_limit);
        let window_start = now - window();
        let reset = (window_start + window()).timestamp();

        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());

        // Rejections must not create entries for unseen keys
        let count = match requests.get_mut(key) {
            Some(timestamps) => {
                prune(timestamps, window_start);
                timestamps.len()
            }
            None => 0,
        };

        if count >= limit as usize {
            debug!(limit, count, "rate limit reached");
            return RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset,
            };
        }

        let timestamps = requests.entry(key.to_string()).or_default();
        timestamps.push_back(now);
        let used = u32::try_from(timestamps.len()).unwrap_or(u32::MAX);

        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit.saturating_sub(used),
            reset,
        }
    }

    /// Drop keys with no timestamps left inside the window. Returns how many
    /// keys were evicted.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let window_start = now - window();
        let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let before = requests.len();
        requests.retain(|_, timestamps| {
            prune(timestamps, window_start);
            !timestamps.is_empty()
        });
        before - requests.len()
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Stored timestamps for `key`, without pruning
    pub fn recorded(&self, key: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

/// Remove timestamps at or before `window_start`. A timestamp exactly one
/// window old no longer counts.
fn prune(timestamps: &mut VecDeque<DateTime<Utc>>, window_start: DateTime<Utc>) {
    while timestamps.front().is_some_and(|t| *t <= window_start) {
        timestamps.pop_front();
    }
}

/// Periodically evict idle keys so the map does not grow with every key ever seen
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = limiter.sweep();
            if evicted > 0 {
                debug!(evicted, remaining = limiter.tracked_keys(), "rate limiter sweep");
            }
        }
    })
}
