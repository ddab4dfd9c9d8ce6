//! Run statistics.

use std::time::{Duration, Instant};

use sortie_core::capability::StatsRecorder;
use tracing::info;

/// Counters for one bot run. Logged, never persisted.
#[derive(Debug, Clone)]
pub struct Stats {
    started: Instant,
    /// Fully completed sorties.
    pub combat_done: u32,
    /// Commissions started.
    pub commissions_started: u32,
    /// Mission collection passes.
    pub missions_done: u32,
    /// Retirement passes.
    pub retirements: u32,
}

impl Stats {
    /// Start counting at `started`.
    #[must_use]
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            combat_done: 0,
            commissions_started: 0,
            missions_done: 0,
            retirements: 0,
        }
    }

    /// Completed sorties per hour over `elapsed`.
    #[must_use]
    pub fn sorties_per_hour(&self, elapsed: Duration) -> f64 {
        let hours = elapsed.as_secs_f64() / 3600.0;
        if hours <= 0.0 {
            return 0.0;
        }
        f64::from(self.combat_done) / hours
    }

    /// Log the summary as of `now`.
    pub fn log_summary(&self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started);
        info!(
            elapsed_min = elapsed.as_secs() / 60,
            sorties = self.combat_done,
            sorties_per_hour = %format!("{:.2}", self.sorties_per_hour(elapsed)),
            commissions = self.commissions_started,
            missions = self.missions_done,
            retirements = self.retirements,
            "Run statistics."
        );
    }
}

impl StatsRecorder for Stats {
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
