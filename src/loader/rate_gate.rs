//! Minimum-interval admission check
//!
//! Uses the governor crate with a one-cell bucket: a check succeeds at most
//! once per period. A refused check is dropped, never queued.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::time::Duration;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Admits at most one attempt per period
pub struct RateGate {
    period: Option<Duration>,
    limiter: Option<DirectLimiter>,
}

impl RateGate {
    /// Create a gate; `None` or a zero period admits everything
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            period,
            limiter: build_limiter(period),
        }
    }

    /// Gate that admits everything
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Configured period
    pub fn period(&self) -> Option<Duration> {
        self.period.filter(|p| !p.is_zero())
    }

    /// Try to take the slot for this period
    pub fn try_admit(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }

    /// Forget all previous admissions
    pub fn reset(&mut self) {
        self.limiter = build_limiter(self.period);
    }
}

fn build_limiter(period: Option<Duration>) -> Option<DirectLimiter> {
    let quota = Quota::with_period(period?)?;
    Some(Governor::direct(quota))
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("period", &self.period)
            .finish()
    }
}

#[cfg(test)]
mod rate_gate_tests {
    use super::*;

    #[test]
    fn test_disabled_gate_admits_everything() {
        let gate = RateGate::disabled();
        assert!(gate.period().is_none());
        for _ in 0..10 {
            assert!(gate.try_admit());
        }

        let gate = RateGate::new(Some(Duration::ZERO));
        assert!(gate.period().is_none());
        assert!(gate.try_admit());
        assert!(gate.try_admit());
    }

    #[test]
    fn test_gate_admits_once_per_period() {
        let gate = RateGate::new(Some(Duration::from_secs(60)));
        assert!(gate.try_admit());
        assert!(!gate.try_admit());
        assert!(!gate.try_admit());
    }

    #[tokio::test]
    async fn test_gate_reopens_after_period() {
        let gate = RateGate::new(Some(Duration::from_millis(30)));
        assert!(gate.try_admit());
        assert!(!gate.try_admit());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gate.try_admit());
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut gate = RateGate::new(Some(Duration::from_secs(60)));
        assert!(gate.try_admit());
        assert!(!gate.try_admit());

        gate.reset();
        assert!(gate.try_admit());
    }
}
