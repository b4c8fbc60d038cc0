//! Dual-cadence tick accounting.
//!
//! The loop ticks once per fast period. Every tick runs the fast risk
//! sweep; a tick whose accumulated schedule time has reached the full-cycle
//! period runs the full cycle first, then the sweep. Accounting is based on
//! accumulated scheduled intervals, not wall-clock time, so slow cycles do
//! not drift the schedule.

use crate::config::ScheduleConfig;
use std::time::Duration;

#[derive(Debug)]
pub struct DualCadence {
    fast_period: Duration,
    full_cycle_period: Duration,
    /// Scheduled time accumulated since the last full cycle. Starts at the
    /// full period so the first tick fires a full cycle immediately.
    since_full_cycle: Duration,
}

impl DualCadence {
    pub fn new(schedule: &ScheduleConfig) -> Self {
        let full_cycle_period = Duration::from_secs(schedule.full_cycle_secs);
        Self {
            fast_period: Duration::from_secs(schedule.fast_check_secs),
            full_cycle_period,
            since_full_cycle: full_cycle_period,
        }
    }

    /// Whether this tick should run the full cycle (checked before the
    /// fast sweep on the same tick).
    pub fn full_cycle_due(&self) -> bool {
        self.since_full_cycle >= self.full_cycle_period
    }

    /// Reset the full-cycle accumulator after running a full cycle.
    pub fn mark_full_cycle_ran(&mut self) {
        self.since_full_cycle = Duration::ZERO;
    }

    /// Account for one completed tick.
    pub fn advance(&mut self) {
        self.since_full_cycle += self.fast_period;
    }

    /// How long to sleep between ticks.
    pub fn tick_interval(&self) -> Duration {
        self.fast_period
    }

    /// Scheduled time remaining until the next full cycle.
    pub fn until_full_cycle(&self) -> Duration {
        self.full_cycle_period.saturating_sub(self.since_full_cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence(fast: u64, full: u64) -> DualCadence {
        DualCadence::new(&ScheduleConfig {
            fast_check_secs: fast,
            full_cycle_secs: full,
            order_throttle_ms: 0,
        })
    }

    #[test]
    fn test_first_tick_fires_full_cycle() {
        let c = cadence(15, 600);
        assert!(c.full_cycle_due());
    }

    #[test]
    fn test_full_cycle_fires_every_full_period() {
        let mut c = cadence(15, 60);
        c.mark_full_cycle_ran();

        let mut full_cycles = 0;
        for _ in 0..8 {
            if c.full_cycle_due() {
                full_cycles += 1;
                c.mark_full_cycle_ran();
            }
            c.advance();
        }
        // Due on the fifth tick (4 x 15s accumulated), then due again right
        // after the eighth.
        assert_eq!(full_cycles, 1);
        assert!(c.full_cycle_due());
    }

    #[test]
    fn test_accounting_uses_scheduled_intervals() {
        let mut c = cadence(15, 60);
        c.mark_full_cycle_ran();
        for _ in 0..3 {
            c.advance();
            assert!(!c.full_cycle_due());
        }
        c.advance();
        assert!(c.full_cycle_due());
        assert_eq!(c.until_full_cycle(), Duration::ZERO);
    }

    #[test]
    fn test_tick_interval_is_fast_period() {
        assert_eq!(cadence(15, 600).tick_interval(), Duration::from_secs(15));
    }
}
