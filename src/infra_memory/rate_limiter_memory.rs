use crate::domain_port::Clock;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Fixed-window request counter per client address.
pub struct FixedWindowRateLimiter {
    windows: DashMap<IpAddr, Window>,
    window: chrono::Duration,
    max_requests: u32,
    clock: Arc<dyn Clock>,
}

impl FixedWindowRateLimiter {
    pub fn new(window: Duration, max_requests: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            max_requests,
            clock,
        }
    }

    fn window_end(&self, started: DateTime<Utc>) -> DateTime<Utc> {
        started
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Counts one request from `client` against its current window.
    pub fn check(&self, client: IpAddr) -> RateDecision {
        let now = self.clock.now();
        let mut slot = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        if now >= self.window_end(slot.started) {
            *slot = Window {
                started: now,
                count: 0,
            };
        }

        if slot.count >= self.max_requests {
            let retry_after = (self.window_end(slot.started) - now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            return RateDecision::Limited { retry_after };
        }

        slot.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - slot.count,
        }
    }

    /// Drops windows that have already ended.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now < self.window_end(window.started));
        before.saturating_sub(self.windows.len())
    }
}
