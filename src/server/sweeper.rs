use crate::domain_port::ResponseCache;
use crate::infra_memory::FixedWindowRateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically drops expired cache entries and finished rate-limit windows,
/// which would otherwise only go away when read again.
pub struct Sweeper {
    cache: Arc<dyn ResponseCache>,
    rate_limiter: Arc<FixedWindowRateLimiter>,
    every: Duration,
    cancellation_token: CancellationToken,
}

impl Sweeper {
    pub fn new(
        cache: Arc<dyn ResponseCache>,
        rate_limiter: Arc<FixedWindowRateLimiter>,
        every: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            cache,
            rate_limiter,
            every,
            cancellation_token,
        }
    }

    fn tick_once(&self) {
        let expired = self.cache.purge_expired();
        let idle = self.rate_limiter.purge_idle();
        if expired > 0 || idle > 0 {
            tracing::debug!(
                expired,
                idle,
                remaining = self.cache.len(),
                "sweep removed stale entries"
            );
        }
    }

    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Sweeper shutting down...");
                    break;
                }
                _ = interval.tick() => self.tick_once(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::UserId;
    use crate::domain_port::CacheKey;
    use crate::infra_memory::{ManualClock, MemoryResponseCache};
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn tick_purges_expired_entries_and_idle_windows() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(MemoryResponseCache::new(clock.clone(), 0));
        let limiter = Arc::new(FixedWindowRateLimiter::new(
            Duration::from_secs(10),
            5,
            clock.clone(),
        ));
        cache.put(
            CacheKey::for_user(&UserId::from("1"), "/api/profile"),
            Arc::from("{}"),
            Duration::from_secs(5),
        );
        limiter.check(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let sweeper = Sweeper::new(
            cache.clone(),
            limiter.clone(),
            Duration::from_secs(1),
            CancellationToken::new(),
        );
        sweeper.tick_once();
        assert_eq!(cache.len(), 1);

        clock.advance(Duration::from_secs(10));
        sweeper.tick_once();
        assert_eq!(cache.len(), 0);
        assert_eq!(limiter.purge_idle(), 0);
    }

    #[tokio::test]
    async fn run_returns_once_cancelled() {
        let clock = Arc::new(ManualClock::default());
        let token = CancellationToken::new();
        let sweeper = Sweeper::new(
            Arc::new(MemoryResponseCache::new(clock.clone(), 0)),
            Arc::new(FixedWindowRateLimiter::new(Duration::from_secs(10), 5, clock)),
            Duration::from_secs(3600),
            token.clone(),
        );
        let handle = tokio::spawn(async move { sweeper.run().await });

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("Sweeper should stop after cancellation.")
            .expect("Sweeper task should not panic.");
    }
}
