//! Retirement cycle: dispose of common and rare ships every few sorties.
//!
//! Runs once for every `retire_cycle` completed sorties. The dock is
//! filtered down to common and rare ships, then the first ten slots are
//! selected and retired until nothing selectable is left.

use std::time::Duration;

use sortie_core::capability::{StatsRecorder, Template, DEFAULT_SIMILARITY};
use sortie_core::controller::Controller;
use sortie_core::cycle::Cycle;
use sortie_core::error::Result;
use sortie_core::geometry::Region;
use sortie_core::ui;
use tracing::{debug, info};

/// Budget for the retire tab to appear.
const RETIRE_TAB_WAIT: Duration = Duration::from_secs(2);
/// Budget for the filter dialog to appear.
const FILTER_DIALOG_WAIT: Duration = Duration::from_secs(1);
/// Similarity for the retire dialog buttons.
const DIALOG_SIMILARITY: f32 = 0.7;

/// Filter button of the dock.
const FILTER_BUTTON: Region = Region::new(1090, 15, 150, 40);
/// "All" toggle of the filter dialog, cleared before picking rarities.
const FILTER_ALL: Region = Region::new(300, 570, 100, 20);

/// Left edge of the first ship slot.
const SLOT_X: i32 = 90;
/// Horizontal distance between ship slots.
const SLOT_SPACING: i32 = 170;
/// Top row of the dock.
const SLOT_ROW_TOP: i32 = 180;
/// Second row of the dock.
const SLOT_ROW_BOTTOM: i32 = 412;

/// Tap areas of the ten ship slots selected per pass: seven on the top row,
/// three on the second.
#[must_use]
pub fn ship_slots() -> Vec<Region> {
    let row = |y: i32, count: i32| (0..count).map(move |i| Region::new(SLOT_X + i * SLOT_SPACING, y, 30, 15));
    row(SLOT_ROW_TOP, 7).chain(row(SLOT_ROW_BOTTOM, 3)).collect()
}

/// Retires ships after every `retire_cycle` completed sorties.
#[derive(Debug)]
pub struct RetirementCycle {
    retire_cycle: u32,
    handled: Option<u32>,
}

impl RetirementCycle {
    /// Retire after every `retire_cycle` sorties (at least 1).
    #[must_use]
    pub fn new(retire_cycle: u32) -> Self {
        Self {
            retire_cycle: retire_cycle.max(1),
            handled: None,
        }
    }

    /// Whether a retirement is due at `combat_done` completed sorties.
    #[must_use]
    pub fn is_due(&self, combat_done: u32) -> bool {
        combat_done > 0
            && combat_done % self.retire_cycle == 0
            && self.handled != Some(combat_done)
    }

    fn set_filters(ctl: &mut Controller) -> Result<()> {
        ctl.touch_region(FILTER_BUTTON)?;
        ctl.wait_for(&Template::ShipFilterConfirm, FILTER_DIALOG_WAIT, DEFAULT_SIMILARITY)?;
        ctl.touch_region(FILTER_ALL)?;
        ctl.refresh()?;
        ctl.find_and_touch(&Template::ShipFilterRarityCommon, DEFAULT_SIMILARITY)?;
        ctl.refresh()?;
        ctl.find_and_touch(&Template::ShipFilterRarityRare, DEFAULT_SIMILARITY)?;
        ctl.refresh()?;
        ctl.find_and_touch(&Template::ShipFilterConfirm, DEFAULT_SIMILARITY)?;
        Ok(())
    }

    fn select_ships(ctl: &mut Controller) -> Result<()> {
        debug!("selecting ships for retirement");
        for slot in ship_slots() {
            ctl.touch_region(slot)?;
        }
        Ok(())
    }

    fn retire_ships(ctl: &mut Controller) -> Result<()> {
        const DIALOGS: [Template; 6] = [
            Template::RetireConfirm,
            Template::RetireConfirm,
            Template::ItemsReceived,
            Template::RetireConfirm,
            Template::RetireDisassemble,
            Template::ItemsReceived,
        ];
        for dialog in &DIALOGS {
            ctl.refresh()?;
            ctl.find_and_touch(dialog, DIALOG_SIMILARITY)?;
        }
        Ok(())
    }
}

impl Cycle for RetirementCycle {
    fn name(&self) -> &'static str {
        "retirement"
    }

    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool> {
        let combat_done = stats.combat_done();
        if !self.is_due(combat_done) {
            return Ok(false);
        }
        self.handled = Some(combat_done);
        info!(combat_done, "Retiring ships.");

        ctl.refresh()?;
        while !ctl.find_and_touch(&Template::HomeMenuBuild, DEFAULT_SIMILARITY)? {
            ctl.checkpoint()?;
            ctl.touch_region(ui::NAV_BACK)?;
            ctl.refresh()?;
        }
        ctl.wait_and_touch(&Template::BuildMenuRetire, RETIRE_TAB_WAIT, DEFAULT_SIMILARITY)?;
        ctl.sleep(1.0);
        Self::set_filters(ctl)?;
        ctl.sleep(1.0);

        loop {
            ctl.checkpoint()?;
            Self::select_ships(ctl)?;
            ctl.refresh()?;
            if ctl.exists(&Template::RetireNoneSelected, DEFAULT_SIMILARITY)? {
                break;
            }
            Self::retire_ships(ctl)?;
        }

        ctl.touch_region(ui::NAV_BACK)?;
        stats.increment_retirements();
        Ok(true)
    }
}
