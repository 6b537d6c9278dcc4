//! GCRA login limiter held in process memory.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as Governor};

use gym_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::RateLimitConfig;

/// Replenished clients are forgotten once the key count has grown this much
/// past its last sweep.
const SWEEP_GROWTH: usize = 1024;

type KeyedGovernor =
    Governor<String, DefaultKeyedStateStore<String>, DefaultClock, StateInformationMiddleware>;

/// Per-client limiter. Attempts replenish continuously (one every
/// `window / max_requests`) rather than all at once when a window closes.
///
/// Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    governor: KeyedGovernor,
    clock: DefaultClock,
    sweep_at: AtomicUsize,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| RateLimitError::Config("max_requests must be non-zero".into()))?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or_else(|| RateLimitError::Config("window must be non-zero".into()))?
            .allow_burst(burst);

        Ok(Self {
            governor: Governor::keyed(quota).with_middleware::<StateInformationMiddleware>(),
            clock: DefaultClock::default(),
            sweep_at: AtomicUsize::new(SWEEP_GROWTH),
        })
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.governor.len()
    }

    fn sweep_if_grown(&self) {
        if self.governor.len() < self.sweep_at.load(Ordering::Relaxed) {
            return;
        }
        self.governor.retain_recent();
        self.governor.shrink_to_fit();
        self.sweep_at.store(self.governor.len() + SWEEP_GROWTH, Ordering::Relaxed);
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        let outcome = self.governor.check_key(&key.to_string());
        self.sweep_if_grown();

        Ok(match outcome {
            Ok(snapshot) => RateLimitResult {
                allowed: true,
                remaining: snapshot.remaining_burst_capacity(),
                reset_after: snapshot.quota().replenish_interval(),
            },
            Err(not_until) => RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after: not_until.wait_time_from(self.clock.now()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_counts_down_then_blocks() {
        let limiter = limiter(3);

        assert_eq!(limiter.check("10.0.0.1").await.unwrap().remaining, 2);
        assert_eq!(limiter.check("10.0.0.1").await.unwrap().remaining, 1);
        assert_eq!(limiter.check("10.0.0.1").await.unwrap().remaining, 0);

        let blocked = limiter.check("10.0.0.1").await.unwrap();
        assert!(!blocked.allowed);
        assert!(blocked.reset_after > Duration::ZERO);
        assert!(blocked.reset_after <= Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = limiter(1);

        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_replenished_clients_swept_once_grown() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(10),
        })
        .unwrap();

        for i in 0..SWEEP_GROWTH - 1 {
            limiter.check(&format!("10.1.{}.{}", i / 256, i % 256)).await.unwrap();
        }
        assert_eq!(limiter.tracked_clients(), SWEEP_GROWTH - 1);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Reaching the threshold sweeps everyone who has replenished.
        limiter.check("10.2.0.1").await.unwrap();
        assert_eq!(limiter.tracked_clients(), 1);

        // Below the next threshold nothing is swept, replenished or not.
        tokio::time::sleep(Duration::from_millis(50)).await;
        limiter.check("10.2.0.2").await.unwrap();
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_degenerate_config_rejected() {
        let zero_max = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 0,
            window: Duration::from_secs(60),
        });
        assert!(matches!(zero_max, Err(RateLimitError::Config(_))));

        let zero_window = InMemoryRateLimiter::new(RateLimitConfig {
            max_requests: 5,
            window: Duration::ZERO,
        });
        assert!(matches!(zero_window, Err(RateLimitError::Config(_))));
    }
}
