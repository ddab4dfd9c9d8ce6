//! Mission cycle: collect finished mission rewards.

use sortie_core::capability::{StatsRecorder, Template, DEFAULT_SIMILARITY};
use sortie_core::controller::Controller;
use sortie_core::cycle::Cycle;
use sortie_core::error::Result;
use sortie_core::geometry::Region;
use sortie_core::ui;
use tracing::info;

/// Polls the home screen for the mission notification.
#[derive(Debug, Default)]
pub struct MissionCycle;

impl MissionCycle {
    /// Create the cycle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Cycle for MissionCycle {
    fn name(&self) -> &'static str {
        "missions"
    }

    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool> {
        ctl.refresh()?;
        if !ctl.find_and_touch(&Template::MissionComplete, DEFAULT_SIMILARITY)? {
            return Ok(false);
        }
        info!("Finished missions found. Collecting rewards.");
        stats.increment_missions_done();
        ctl.sleep(0.5);
        ctl.refresh()?;
        while ctl.find_and_touch(&Template::CollectMission, DEFAULT_SIMILARITY)? {
            ctl.checkpoint()?;
            ctl.touch_region(Region::FULL_SCREEN)?;
            ctl.refresh()?;
        }
        ctl.touch_region(ui::NAV_BACK)?;
        Ok(true)
    }
}
