use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub mod rate_limits {
    /// Pacing used when the configuration does not name one. The hourly
    /// quota is far below this, so it only smooths bursts inside one run.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
}

/// Proactive request pacer shared by every request in a session.
///
/// ```ignore
/// let limiter = ApiRateLimiter::new(10);
/// limiter.wait().await;
/// transport.send(request).await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<DirectLimiter>,
    rps: NonZeroU32,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` (0 is treated as 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
            rps,
        }
    }

    /// Wait until another request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    pub fn requests_per_second(&self) -> u32 {
        self.rps.get()
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter")
            .field("rps", &self.rps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_rps_is_clamped_to_one() {
        assert_eq!(ApiRateLimiter::new(0).requests_per_second(), 1);
        assert_eq!(ApiRateLimiter::new(25).requests_per_second(), 25);
    }

    #[tokio::test]
    async fn test_burst_within_quota_is_immediate() {
        let limiter = ApiRateLimiter::new(100);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_clones_share_quota() {
        let limiter = ApiRateLimiter::new(1);
        let clone = limiter.clone();
        limiter.wait().await;
        let start = Instant::now();
        clone.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
