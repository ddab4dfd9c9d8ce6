//! Commission cycle: redeem finished commissions and start new ones.

use sortie_core::capability::{StatsRecorder, Template, DEFAULT_SIMILARITY};
use sortie_core::controller::{Controller, SWIPE_DURATION_MS};
use sortie_core::cycle::Cycle;
use sortie_core::error::Result;
use sortie_core::geometry::{Point, Region};
use tracing::{debug, info};

/// Commissions that can run at the same time.
pub const MAX_RUNNING: usize = 4;

/// Similarity for counting running commissions.
const IN_ACTION_SIMILARITY: f32 = 0.87;

/// Close area of the commission detail panel.
const DETAIL_CLOSE: Region = Region::new(120, 60, 140, 650);
/// Empty area of the home screen that dismisses leftover popups.
const HOME_CLEAR: Region = Region::new(530, 60, 740, 590);

/// Drag that scrolls the commission list to the top.
const LIST_TOP: (Point, Point) = (Point::new(190, 75), Point::new(190, 650));
/// Drag that scrolls the commission list down.
const LIST_DOWN: (Point, Point) = (Point::new(190, 650), Point::new(190, 75));

/// Polls the home screen for the commission notification.
#[derive(Debug, Default)]
pub struct CommissionCycle;

impl CommissionCycle {
    /// Create the cycle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn redeem_finished(ctl: &mut Controller) -> Result<()> {
        while ctl.find_and_touch(&Template::CommissionComplete, DEFAULT_SIMILARITY)? {
            ctl.checkpoint()?;
            info!("Completed commission found. Redeeming reward.");
            ctl.touch_region(Region::FULL_SCREEN)?;
            ctl.sleep(1.0);
            ctl.touch_region(Region::FULL_SCREEN)?;
            ctl.sleep(1.0);
            ctl.refresh()?;
        }
        Ok(())
    }

    fn start_new(ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<()> {
        ctl.swipe(LIST_TOP.0, LIST_TOP.1, SWIPE_DURATION_MS)?;
        let mut running = ctl
            .find_all(&Template::CommissionInAction, IN_ACTION_SIMILARITY)?
            .len();
        debug!(running, "commissions in progress");

        while running < MAX_RUNNING {
            ctl.checkpoint()?;
            ctl.swipe(LIST_DOWN.0, LIST_DOWN.1, SWIPE_DURATION_MS)?;
            if !ctl.find_and_touch(&Template::CommissionSelect, DEFAULT_SIMILARITY)? {
                debug!("no selectable commission left");
                break;
            }
            ctl.refresh()?;
            ctl.find_and_touch(&Template::CommissionAdvice, DEFAULT_SIMILARITY)?;
            ctl.refresh()?;
            ctl.find_and_touch(&Template::CommissionStart, DEFAULT_SIMILARITY)?;
            ctl.touch_region(DETAIL_CLOSE)?;
            running += 1;
            stats.increment_commissions_started();
            info!(running, "Commission started.");
        }
        Ok(())
    }
}

impl Cycle for CommissionCycle {
    fn name(&self) -> &'static str {
        "commissions"
    }

    /// Never reports work; commissions alone do not warrant a stats summary.
    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool> {
        ctl.refresh()?;
        if !ctl.find_and_touch(&Template::CommissionNotification, DEFAULT_SIMILARITY)? {
            return Ok(false);
        }
        info!("Completed commissions found. Opening commission panel.");
        ctl.refresh()?;
        Self::redeem_finished(ctl)?;

        if ctl.find_and_touch(&Template::CommissionGo, DEFAULT_SIMILARITY)? {
            Self::start_new(ctl, stats)?;
        }

        ctl.refresh()?;
        ctl.find_and_touch(&Template::NavigateBackHome, DEFAULT_SIMILARITY)?;
        ctl.touch_region(HOME_CLEAR)?;
        Ok(false)
    }
}
