//! Test fixtures and helpers.
//!
//! Deterministic stand-ins for the clock, the pacer and the stats recorder.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use sortie_core::capability::{Clock, Pacer, StatsRecorder};
use sortie_core::session::CombatConfig;

/// A clock that only moves when told to.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Start at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A pacer that returns immediately, advancing a manual clock by the base
/// delay so time-budgeted waits still expire.
#[derive(Debug, Clone)]
pub struct InstantPacer {
    clock: ManualClock,
    paused: Arc<Mutex<Duration>>,
}

impl InstantPacer {
    /// Pacer driving `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            paused: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Total simulated pause time.
    #[must_use]
    pub fn total_paused(&self) -> Duration {
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Pacer for InstantPacer {
    fn pause(&mut self, base: Duration, _flex: Duration) {
        self.clock.advance(base);
        *self.paused.lock().unwrap_or_else(PoisonError::into_inner) += base;
    }
}

/// Stats recorder that just counts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingStats {
    /// Completed sorties.
    pub combat_done: u32,
    /// Started commissions.
    pub commissions_started: u32,
    /// Mission collection passes.
    pub missions_done: u32,
    /// Retirement passes.
    pub retirements: u32,
}

impl StatsRecorder for RecordingStats {
    fn increment_combat_done(&mut self) {
        self.combat_done += 1;
    }

    fn increment_commissions_started(&mut self) {
        self.commissions_started += 1;
    }

    fn increment_missions_done(&mut self) {
        self.missions_done += 1;
    }

    fn increment_retirements(&mut self) {
        self.retirements += 1;
    }

    fn combat_done(&self) -> u32 {
        self.combat_done
    }
}

/// A combat configuration for `map` needing `kills` trash kills.
///
/// # Panics
///
/// Panics if `map` is not a valid map identifier.
#[must_use]
pub fn combat_config(map: &str, kills: u32) -> CombatConfig {
    CombatConfig::new(map.parse().expect("valid map id"), kills)
}

/// Proptest strategies for the geometric invariants.
pub mod strategies {
    use proptest::prelude::*;
    use sortie_core::geometry::{Point, SCREEN_HEIGHT, SCREEN_WIDTH};

    /// A point anywhere on the screen.
    pub fn arb_screen_point() -> impl Strategy<Value = Point> {
        (0..SCREEN_WIDTH, 0..SCREEN_HEIGHT).prop_map(|(x, y)| Point::new(x, y))
    }

    /// A point within a small window, so that near-duplicates are common.
    pub fn arb_clustered_point() -> impl Strategy<Value = Point> {
        (300..380i32, 200..260i32).prop_map(|(x, y)| Point::new(x, y))
    }

    /// A list of raw detections mixing spread-out and clustered points.
    pub fn arb_candidates(max_len: usize) -> impl Strategy<Value = Vec<Point>> {
        proptest::collection::vec(
            prop_oneof![arb_screen_point(), arb_clustered_point()],
            0..max_len,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_pacer_drives_shared_clock() {
        let clock = ManualClock::new();
        let start = clock.now();
        let mut pacer = InstantPacer::new(clock.clone());
        let handle = pacer.clone();

        pacer.pause(Duration::from_millis(1500), Duration::from_millis(500));
        pacer.pause(Duration::from_secs(2), Duration::ZERO);

        assert_eq!(clock.now() - start, Duration::from_millis(3500));
        assert_eq!(handle.total_paused(), Duration::from_millis(3500));
    }
}
