//! Nearest-target selection with a radial scan fallback.

use tracing::{debug, info};

use crate::controller::Controller;
use crate::detection::detect_enemies;
use crate::error::Result;
use crate::fleet::{locate_fleet, scan_swipe, CompassScan};
use crate::geometry::{nearest, Point};
use crate::session::CombatSession;

/// Horizontal swipe distance of the target scan.
pub const TARGET_X_DISTANCE: f64 = 125.0;
/// Vertical swipe distance of the target scan.
pub const TARGET_Y_DISTANCE: f64 = 175.0;

/// The contact nearest to `origin` in the current frame, if any.
pub fn nearest_contact(
    ctl: &Controller,
    origin: Point,
    blacklist: &[Point],
) -> Result<Option<Point>> {
    let contacts = detect_enemies(ctl, blacklist)?;
    Ok(nearest(&contacts, origin).map(|(idx, _)| contacts[idx]))
}

/// Find the enemy contact nearest to the fleet.
///
/// Localizes the fleet, then alternates detection with compass swipes while
/// tracking where the fleet moved on screen. After a full compass pass
/// without contacts the camera is flagged for refocus and the fleet is
/// localized again. Scan distances keep growing across passes. There is no
/// iteration cap; only the cancellation checkpoint ends a fruitless search.
pub fn closest_enemy(
    ctl: &mut Controller,
    session: &mut CombatSession,
    blacklist: &[Point],
) -> Result<Point> {
    let mut scan = CompassScan::new(TARGET_X_DISTANCE, TARGET_Y_DISTANCE);
    loop {
        ctl.checkpoint()?;
        let mut location = locate_fleet(ctl, session)?;
        for _ in 0..CompassScan::PASS_LEN {
            let contacts = detect_enemies(ctl, blacklist)?;
            if let Some((idx, distance)) = nearest(&contacts, location) {
                let target = contacts[idx];
                info!(%location, %target, distance, "Closest enemy selected.");
                return Ok(target);
            }
            let (direction, distance) = scan_swipe(ctl, &mut scan)?;
            location = direction.shift(location, distance);
        }
        debug!(swipes = scan.steps_taken(), "no contacts in compass pass");
        session.refocus_needed = true;
    }
}
