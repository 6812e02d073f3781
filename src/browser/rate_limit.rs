//! Politeness delays between navigations
//!
//! Uses the governor crate: a single-token bucket refilled once per
//! interval, with random jitter added on every wait.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Jitter, Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for navigation pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Minimum time between two navigations
    pub min_interval: Duration,
    /// Upper bound of the random delay added on top
    pub jitter: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(500),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            min_interval,
            jitter,
        }
    }

    /// No pacing at all (tests, local fixtures)
    pub fn unthrottled() -> Self {
        Self {
            min_interval: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

/// Token bucket pacing navigations
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>>,
    jitter: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let limiter = if config.min_interval.is_zero() && config.jitter.is_zero() {
            None
        } else {
            // Jitter alone still needs a bucket to hang off
            let period = config.min_interval.max(Duration::from_millis(1));
            Quota::with_period(period)
                .map(|quota| quota.allow_burst(NonZeroU32::MIN))
                .map(|quota| Arc::new(Governor::direct(quota)))
        };

        Self {
            limiter,
            jitter: config.jitter,
        }
    }

    /// Wait until the next navigation may start
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter
                .until_ready_with_jitter(Jitter::up_to(self.jitter))
                .await;
        }
    }

    /// Check if a navigation could start immediately
    pub fn check(&self) -> bool {
        self.limiter.as_ref().map_or(true, |l| l.check().is_ok())
    }

    /// Whether pacing is active
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimiterConfig::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.is_enabled())
            .field("jitter", &self.jitter)
            .finish()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.min_interval, Duration::from_millis(500));
        assert_eq!(config.jitter, Duration::from_millis(1000));
    }

    #[test]
    fn test_unthrottled_is_disabled() {
        let limiter = RateLimiter::new(&RateLimiterConfig::unthrottled());
        assert!(!limiter.is_enabled());
        assert!(limiter.check());
        tokio_test::block_on(limiter.wait());
    }

    #[test]
    fn test_single_token_bucket() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(
            Duration::from_secs(60),
            Duration::ZERO,
        ));
        assert!(limiter.is_enabled());

        // First navigation goes through, the second has to wait
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[tokio::test]
    async fn test_rate_limiter_wait() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(
            Duration::from_millis(10),
            Duration::from_millis(5),
        ));

        limiter.wait().await;
        limiter.wait().await;
    }
}
