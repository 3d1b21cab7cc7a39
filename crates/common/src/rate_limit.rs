use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

/// One counting window for a single key.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate-limit check, carrying everything the HTTP layer
/// needs for `Retry-After` and `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

/// Fixed-window request counter keyed by an arbitrary string (we key by
/// endpoint path). The counter map is shared process-wide behind an `Arc`;
/// each entry counts requests since its window started and resets once the
/// window elapses.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
    enabled: bool,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window_secs: u64, enabled: bool) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window: Duration::from_secs(window_secs),
            enabled,
        }
    }

    /// Count one request against `key` and decide whether it may proceed.
    /// Requests beyond the limit are rejected without advancing the counter,
    /// so the window expires on schedule.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision {
                allowed: true,
                limit: self.max_requests,
                remaining: self.max_requests,
                reset_secs: self.window.as_secs(),
            };
        }

        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window { started: now, count: 0 });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        let reset_secs = self
            .window
            .saturating_sub(now.duration_since(entry.started))
            .as_secs();

        if entry.count >= self.max_requests {
            warn!(key, count = entry.count, "rate limit exceeded");
            return RateLimitDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                reset_secs,
            };
        }

        entry.count += 1;
        debug!(key, count = entry.count, "rate limit check passed");
        RateLimitDecision {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - entry.count,
            reset_secs,
        }
    }
}
