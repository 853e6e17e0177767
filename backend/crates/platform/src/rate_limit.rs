//! Rate Limiting Infrastructure
//!
//! Rolling-window rate limit configuration and decision types. Counting is
//! done by the caller's storage layer; this module only holds the window
//! arithmetic so every limiter in the system reports the same shape.

use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Decide whether a request is allowed given the count of prior
    /// requests observed inside the current window.
    pub fn check(&self, count_in_window: u32, window_started_ms: i64) -> RateLimitResult {
        let allowed = count_in_window < self.max_requests;
        RateLimitResult {
            allowed,
            remaining: self.max_requests.saturating_sub(count_in_window),
            reset_at_ms: window_started_ms + self.window_ms(),
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}
