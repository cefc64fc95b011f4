//! Fixed-window rate limiter keyed by client identifier.
//!
//! Each identifier gets one [`RateRecord`]. The first request opens a window;
//! requests inside the window are counted until the cap is reached, after
//! which the identifier is rejected until the window expires. Bursts of up to
//! twice the cap are possible across a window boundary.
//!
//! State lives in this process only. Callers pass the current [`Instant`] in,
//! which keeps the limiter deterministic under test.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Identifier used when no client address can be determined.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Longest window the limiter accepts.
pub const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-identifier window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    /// Requests admitted in the current window
    pub count: u32,
    /// When the current window ends
    pub window_reset_at: Instant,
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is admitted
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Request is rejected
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Thread-safe fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_per_window: u32,
    records: Mutex<HashMap<String, RateRecord>>,
}

impl RateLimiter {
    /// Create a limiter. Zero values are raised to the smallest usable value
    /// and the window is capped at [`MAX_WINDOW`].
    pub fn new(window: Duration, max_per_window: u32) -> Self {
        if window > MAX_WINDOW {
            warn!(
                window_secs = window.as_secs(),
                max_window_secs = MAX_WINDOW.as_secs(),
                "rate_limit_window_capped"
            );
        }

        Self {
            window: window.clamp(Duration::from_secs(1), MAX_WINDOW),
            max_per_window: max_per_window.max(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_per_window(&self) -> u32 {
        self.max_per_window
    }

    /// Admit or reject a request from `identifier` at time `now`.
    ///
    /// Lookup, window reset and increment happen under one lock, so two
    /// concurrent requests cannot both take the last slot.
    pub async fn check(&self, identifier: &str, now: Instant) -> RateLimitResult {
        let mut records = self.records.lock().await;

        if let Some(record) = records.get_mut(identifier) {
            if now <= record.window_reset_at {
                if record.count < self.max_per_window {
                    record.count += 1;
                    return RateLimitResult::Allowed {
                        remaining: self.max_per_window - record.count,
                    };
                }

                let retry_after = record.window_reset_at.saturating_duration_since(now);
                debug!(identifier, count = record.count, ?retry_after, "rate_limit_exceeded");
                return RateLimitResult::Limited { retry_after };
            }
        }

        // New identifier or expired window
        records.insert(
            identifier.to_string(),
            RateRecord {
                count: 1,
                window_reset_at: self.window_end(now),
            },
        );
        RateLimitResult::Allowed {
            remaining: self.max_per_window - 1,
        }
    }

    /// End of a window opened at `now`. Saturates instead of overflowing.
    fn window_end(&self, now: Instant) -> Instant {
        now.checked_add(self.window)
            .or_else(|| now.checked_add(MAX_WINDOW))
            .unwrap_or(now)
    }

    /// Boolean form of [`RateLimiter::check`].
    pub async fn admit(&self, identifier: &str, now: Instant) -> bool {
        self.check(identifier, now).await.is_allowed()
    }

    /// Drop every record whose window has expired. Returns how many were removed.
    pub async fn prune(&self, now: Instant) -> usize {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| now <= record.window_reset_at);
        before - records.len()
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Snapshot of the record for `identifier`, if any.
    pub async fn record(&self, identifier: &str) -> Option<RateRecord> {
        self.records.lock().await.get(identifier).copied()
    }
}
