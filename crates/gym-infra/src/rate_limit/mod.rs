//! Login attempt limiters.

use std::time::Duration;

mod memory;

pub use memory::InMemoryRateLimiter;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisRateLimiter;

/// At most `max_requests` login attempts per client within `window`.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
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
    /// Reads `LOGIN_RATE_LIMIT_MAX` and `LOGIN_RATE_LIMIT_WINDOW_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok());

        Self {
            max_requests: var("LOGIN_RATE_LIMIT_MAX")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.max_requests),
            window: var("LOGIN_RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}
