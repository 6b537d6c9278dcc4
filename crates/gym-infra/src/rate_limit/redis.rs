//! Fixed-window login attempt counter in Redis, shared by every instance.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;

use gym_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::RateLimitConfig;
use crate::cache::{RedisConfig, connect};

// Starts the window on the first attempt. Returns [attempts, seconds_left].
const COUNT_ATTEMPT: &str = r#"
local attempts = redis.call('INCR', KEYS[1])
if attempts == 1 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
end
return {attempts, redis.call('TTL', KEYS[1])}
"#;

pub struct RedisRateLimiter {
    conn: ConnectionManager,
    redis: RedisConfig,
    config: RateLimitConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(redis: &RedisConfig, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        if config.max_requests == 0 || config.window.as_secs() == 0 {
            return Err(RateLimitError::Config(
                "max_requests and a whole-second window are required".into(),
            ));
        }

        let conn = connect(redis)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;
        tracing::info!(
            namespace = %redis.namespace,
            max_attempts = config.max_requests,
            window_secs = config.window.as_secs(),
            "Login rate limiter backed by Redis"
        );

        Ok(Self {
            conn,
            redis: redis.clone(),
            config,
            script: Script::new(COUNT_ATTEMPT),
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let mut conn = self.conn.clone();

        let (attempts, ttl): (i64, i64) = self
            .script
            .key(self.redis.key(&format!("login_attempts:{key}")))
            .arg(self.config.window.as_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let attempts = u32::try_from(attempts.max(0)).unwrap_or(u32::MAX);
        // TTL is -1 if the key somehow lost its expiry; report the full window then.
        let reset_after = u64::try_from(ttl)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(self.config.window);

        Ok(RateLimitResult {
            allowed: attempts <= self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(attempts),
            reset_after,
        })
    }
}
