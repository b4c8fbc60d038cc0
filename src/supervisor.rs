//! Failure supervision for the main loop.
//!
//! A bad cycle never terminates the process. Failures are counted and
//! answered with an exponentially growing, capped backoff; a success resets
//! the streak. The counters are readable so repeated failures surface as
//! observable state, not just log lines.

use std::time::Duration;
use tracing::{info, warn};

const BASE_BACKOFF: Duration = Duration::from_secs(10);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct CycleSupervisor {
    base_backoff: Duration,
    max_backoff: Duration,
    consecutive_failures: u32,
    total_failures: u64,
}

impl Default for CycleSupervisor {
    fn default() -> Self {
        Self::new(BASE_BACKOFF, MAX_BACKOFF)
    }
}

impl CycleSupervisor {
    pub fn new(base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            base_backoff,
            max_backoff,
            consecutive_failures: 0,
            total_failures: 0,
        }
    }

    /// Record a clean cycle, resetting the failure streak.
    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            info!(
                recovered_after = self.consecutive_failures,
                "Cycle recovered after failures"
            );
        }
        self.consecutive_failures = 0;
    }

    /// Record a failed cycle and return how long to back off before the
    /// next tick.
    pub fn record_failure(&mut self, error: &anyhow::Error) -> Duration {
        self.consecutive_failures += 1;
        self.total_failures += 1;

        let backoff = self.current_backoff();
        warn!(
            error = %error,
            consecutive = self.consecutive_failures,
            total = self.total_failures,
            backoff_secs = backoff.as_secs(),
            "Cycle failed, backing off"
        );
        backoff
    }

    /// Backoff for the current streak: base doubled per extra failure,
    /// capped at the maximum.
    fn current_backoff(&self) -> Duration {
        let exponent = self.consecutive_failures.saturating_sub(1).min(31);
        let backoff = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(exponent));
        backoff.min(self.max_backoff)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let mut sup = CycleSupervisor::new(Duration::from_secs(10), Duration::from_secs(300));
        let err = anyhow!("boom");

        assert_eq!(sup.record_failure(&err), Duration::from_secs(10));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(20));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(40));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(80));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(160));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(300));
        assert_eq!(sup.record_failure(&err), Duration::from_secs(300));
    }

    #[test]
    fn test_success_resets_streak_but_not_total() {
        let mut sup = CycleSupervisor::default();
        let err = anyhow!("boom");

        sup.record_failure(&err);
        sup.record_failure(&err);
        assert_eq!(sup.consecutive_failures(), 2);

        sup.record_success();
        assert_eq!(sup.consecutive_failures(), 0);
        assert_eq!(sup.total_failures(), 2);

        assert_eq!(sup.record_failure(&err), Duration::from_secs(10));
    }

    #[test]
    fn test_deep_streak_does_not_overflow() {
        let mut sup = CycleSupervisor::default();
        let err = anyhow!("boom");
        for _ in 0..100 {
            assert!(sup.record_failure(&err) <= Duration::from_secs(300));
        }
        assert_eq!(sup.total_failures(), 100);
    }
}
