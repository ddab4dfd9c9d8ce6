//! Fleet localization and the compass scan.
//!
//! The fleet is found through the green marker floating above the flagship.
//! When the marker is off-screen the view is dragged around the compass
//! (North, East, South, West) with distances that widen on every pass.

use tracing::{debug, info};

use crate::capability::Template;
use crate::controller::{Controller, SWIPE_DURATION_MS};
use crate::error::Result;
use crate::geometry::{Direction, Point, Region};
use crate::session::CombatSession;
use crate::ui;

/// Similarity used for the fleet marker.
pub const FLEET_MARKER_SIMILARITY: f32 = 0.9;

/// Offset from the marker's top-left to the flagship's feet.
const MARKER_TO_FLAGSHIP: (i32, i32) = (10, 175);

/// Horizontal swipe distance of the locator scan.
pub const LOCATOR_X_DISTANCE: f64 = 250.0;
/// Vertical swipe distance of the locator scan.
pub const LOCATOR_Y_DISTANCE: f64 = 175.0;

/// Growth of an axis' distance after each use.
const AXIS_GROWTH: f64 = 1.25;

/// Per-step multipliers of one compass pass.
const COMPASS_STEPS: [(Direction, f64); 4] = [
    (Direction::North, 1.0),
    (Direction::East, 1.0),
    (Direction::South, 1.5),
    (Direction::West, 1.5),
];

/// Widening compass swipe sequence.
///
/// Yields North ×1.0, East ×1.0, South ×1.5, West ×1.5 and repeats. Each
/// axis' base distance grows ×1.25 after it is used, so later passes reach
/// further out.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassScan {
    x_distance: f64,
    y_distance: f64,
    step: usize,
}

impl CompassScan {
    /// Start a scan with the given base distances.
    #[must_use]
    pub const fn new(x_distance: f64, y_distance: f64) -> Self {
        Self {
            x_distance,
            y_distance,
            step: 0,
        }
    }

    /// Number of swipes in one full pass.
    pub const PASS_LEN: usize = COMPASS_STEPS.len();

    /// The next swipe direction and distance, widening its axis.
    pub fn next_step(&mut self) -> (Direction, i32) {
        let (direction, multiplier) = COMPASS_STEPS[self.step % COMPASS_STEPS.len()];
        self.step += 1;
        let axis = if direction.is_vertical() {
            &mut self.y_distance
        } else {
            &mut self.x_distance
        };
        let distance = (*axis * multiplier).round() as i32;
        *axis *= AXIS_GROWTH;
        (direction, distance)
    }

    /// Swipes issued so far.
    #[must_use]
    pub const fn steps_taken(&self) -> usize {
        self.step
    }
}

/// Swipe the view one step of `scan` and capture the result.
pub fn scan_swipe(ctl: &mut Controller, scan: &mut CompassScan) -> Result<(Direction, i32)> {
    let (direction, distance) = scan.next_step();
    let (from, to) = direction.swipe(distance);
    debug!(?direction, distance, "scan swipe");
    ctl.swipe(from, to, SWIPE_DURATION_MS)?;
    Ok((direction, distance))
}

/// One compass pass looking for `template`.
///
/// Checks the current frame, then after each of the four swipes. Returns the
/// first match, or `None` when the pass ends empty-handed.
pub fn compass_pass(
    ctl: &mut Controller,
    template: &Template,
    similarity: f32,
    scan: &mut CompassScan,
) -> Result<Option<Region>> {
    if let Some(region) = ctl.find(template, similarity)? {
        return Ok(Some(region));
    }
    for _ in 0..CompassScan::PASS_LEN {
        scan_swipe(ctl, scan)?;
        if let Some(region) = ctl.find(template, similarity)? {
            return Ok(Some(region));
        }
    }
    Ok(None)
}

/// Tap the fleet switch button once.
pub fn switch_fleet(ctl: &mut Controller) -> Result<()> {
    ctl.touch_region(ui::SWITCH_FLEET)
}

/// Re-center the camera on the active fleet.
///
/// Switching away and back again snaps the view onto the fleet.
pub fn refocus_fleet(ctl: &mut Controller) -> Result<()> {
    info!("Refocusing fleet.");
    switch_fleet(ctl)?;
    switch_fleet(ctl)?;
    ctl.sleep(2.0);
    ctl.refresh()
}

/// Locate the active fleet on the map.
///
/// Refocuses first when two fleets are deployed and the camera may have
/// drifted. Searches the current frame directly, then scans the compass until
/// the marker shows up. The scan has no iteration cap; it stops only on
/// success or cancellation.
pub fn locate_fleet(ctl: &mut Controller, session: &mut CombatSession) -> Result<Point> {
    if session.two_fleet_mode && session.refocus_needed {
        refocus_fleet(ctl)?;
        session.refocus_needed = false;
    }

    let marker = Template::FleetMarker;
    let mut scan = CompassScan::new(LOCATOR_X_DISTANCE, LOCATOR_Y_DISTANCE);
    let region = loop {
        ctl.checkpoint()?;
        if let Some(region) = compass_pass(ctl, &marker, FLEET_MARKER_SIMILARITY, &mut scan)? {
            break region;
        }
        debug!(swipes = scan.steps_taken(), "fleet marker not found, widening scan");
    };

    let location = region
        .origin()
        .offset(MARKER_TO_FLAGSHIP.0, MARKER_TO_FLAGSHIP.1);
    debug!(%location, "fleet located");
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compass_order_and_multipliers() {
        let mut scan = CompassScan::new(100.0, 200.0);
        assert_eq!(scan.next_step(), (Direction::North, 200));
        assert_eq!(scan.next_step(), (Direction::East, 100));
        // y grew to 250 after North; South uses ×1.5
        assert_eq!(scan.next_step(), (Direction::South, 375));
        // x grew to 125 after East; West uses ×1.5
        assert_eq!(scan.next_step(), (Direction::West, 188));
    }

    #[test]
    fn test_scan_widens_each_pass() {
        let mut scan = CompassScan::new(LOCATOR_X_DISTANCE, LOCATOR_Y_DISTANCE);
        let first: Vec<_> = (0..4).map(|_| scan.next_step().1).collect();
        let second: Vec<_> = (0..4).map(|_| scan.next_step().1).collect();
        for (a, b) in first.iter().zip(&second) {
            assert!(b > a, "second pass should reach further ({a} -> {b})");
        }
        assert_eq!(scan.steps_taken(), 8);
    }
}
