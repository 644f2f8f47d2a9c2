//! Outbound pacing shared by every call to one external service.
//!
//! A semaphore caps in-flight requests and a governor limiter spaces request
//! starts at the configured interval across all concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct OutboundGate {
    permits: Arc<Semaphore>,
    limiter: Option<DirectLimiter>,
    concurrency: usize,
}

/// Held for the duration of one outbound call.
pub struct GatePermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl OutboundGate {
    /// `concurrency` is raised to at least 1; a zero `interval` disables spacing.
    pub fn new(concurrency: usize, interval: Duration) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            limiter: Quota::with_period(interval).map(DirectLimiter::direct),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Waits for a free slot, then for the limiter to allow the next request.
    pub async fn acquire(&self) -> GatePermit {
        // The semaphore is never closed, so `ok()` only guards the type.
        let permit = self.permits.clone().acquire_owned().await.ok();
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        GatePermit { _permit: permit }
    }
}

impl std::fmt::Debug for OutboundGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundGate")
            .field("concurrency", &self.concurrency)
            .field("paced", &self.limiter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gate_caps_in_flight_calls() {
        let gate = OutboundGate::new(2, Duration::ZERO);
        let first = gate.acquire().await;
        let _second = gate.acquire().await;
        assert_eq!(gate.permits.available_permits(), 0);
        drop(first);
        assert_eq!(gate.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let gate = OutboundGate::new(0, Duration::from_millis(1));
        assert_eq!(gate.concurrency(), 1);
        let _permit = gate.acquire().await;
    }
}
