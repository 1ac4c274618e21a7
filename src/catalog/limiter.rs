//! Lease-based pacing for catalog requests.
//!
//! Each [`acquire`](RateLimiter::acquire) hands out one request slot: it
//! waits until the next permitted instant, then books the following slot
//! `interval` later. A [`cool_down`](RateLimiter::cool_down) pushes the next
//! slot further out after the catalog signals overload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;

pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    interval: Duration,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            next_allowed: None,
        }
    }

    /// Wait for the next request slot. The first slot is immediate.
    pub async fn acquire(&mut self) {
        if let Some(next) = self.next_allowed {
            let now = self.clock.now();
            if next > now {
                self.clock.sleep(next - now).await;
            }
        }
        self.next_allowed = Some(self.clock.now() + self.interval);
    }

    /// Hold the next slot back until at least `cooldown` from now.
    pub fn cool_down(&mut self, cooldown: Duration) {
        let until = self.clock.now() + cooldown;
        self.next_allowed = Some(match self.next_allowed {
            Some(next) if next > until => next,
            _ => until,
        });
    }

    /// Time until the next slot opens, zero if it already has.
    pub fn pending_delay(&self) -> Duration {
        match self.next_allowed {
            Some(next) => next.saturating_duration_since(self.clock.now()),
            None => Duration::ZERO,
        }
    }
}
