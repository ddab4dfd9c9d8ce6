//! The outer driver loop.
//!
//! Polls every enabled cycle once per iteration, in the order commission,
//! combat, retirement, mission. Each call runs to completion; the driver
//! never looks behind the [`Cycle`] trait objects.

use std::time::Instant;

use sortie_core::combat::CombatStateMachine;
use sortie_core::controller::Controller;
use sortie_core::cycle::Cycle;
use sortie_core::error::{BotError, Result};
use tracing::{debug, info};

use crate::commission::CommissionCycle;
use crate::config::BotConfig;
use crate::mission::MissionCycle;
use crate::retirement::RetirementCycle;
use crate::stats::Stats;

/// Pause after an iteration in which no cycle did anything.
const IDLE_PAUSE_SECS: f32 = 1.0;

/// Owns the cycles and the run statistics.
pub struct Driver {
    cycles: Vec<Box<dyn Cycle>>,
    stats: Stats,
}

impl Driver {
    /// Drive `cycles` in the given order.
    #[must_use]
    pub fn new(cycles: Vec<Box<dyn Cycle>>, stats: Stats) -> Self {
        Self { cycles, stats }
    }

    /// Build the enabled cycles from a configuration.
    pub fn from_config(config: &BotConfig, now: Instant) -> Result<Self> {
        let mut cycles: Vec<Box<dyn Cycle>> = Vec::new();
        if config.commissions.enabled {
            cycles.push(Box::new(CommissionCycle::new()));
        }
        if config.combat.enabled {
            cycles.push(Box::new(CombatStateMachine::new(config.combat.clone(), now)?));
        }
        if config.retirement.enabled {
            cycles.push(Box::new(RetirementCycle::new(config.retirement.retire_cycle)));
        }
        if config.missions.enabled {
            cycles.push(Box::new(MissionCycle::new()));
        }
        if cycles.is_empty() {
            return Err(BotError::InvalidConfig("no cycle is enabled".to_string()));
        }
        Ok(Self::new(cycles, Stats::new(now)))
    }

    /// Names of the driven cycles, in polling order.
    pub fn cycle_names(&self) -> Vec<&'static str> {
        self.cycles.iter().map(|c| c.name()).collect()
    }

    /// Statistics collected so far.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Poll every cycle once. Returns whether any cycle did work.
    pub fn run_iteration(&mut self, ctl: &mut Controller) -> Result<bool> {
        let mut any_work = false;
        for cycle in &mut self.cycles {
            ctl.checkpoint()?;
            let did_work = cycle.run_cycle(ctl, &mut self.stats)?;
            debug!(cycle = cycle.name(), did_work, "cycle finished");
            any_work |= did_work;
        }
        if any_work {
            self.stats.log_summary(ctl.now());
        }
        Ok(any_work)
    }

    /// Loop until cancelled. Cancellation ends the run cleanly; any other
    /// error is returned.
    pub fn run(&mut self, ctl: &mut Controller) -> Result<()> {
        info!(cycles = ?self.cycle_names(), "Starting driver loop.");
        loop {
            match self.run_iteration(ctl) {
                Ok(true) => {}
                Ok(false) => ctl.sleep(IDLE_PAUSE_SECS),
                Err(err) if err.is_cancellation() => {
                    info!("Run cancelled. Stopping.");
                    self.stats.log_summary(ctl.now());
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }
}
