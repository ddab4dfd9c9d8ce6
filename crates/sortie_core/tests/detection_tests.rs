//! Detection, fleet localization and targeting tests.

use proptest::prelude::*;
use sortie_core::cancel::Cancellation;
use sortie_core::detection::{deduplicate, detect_enemies, MERGE_RADIUS};
use sortie_core::error::BotError;
use sortie_core::fleet::locate_fleet;
use sortie_core::geometry::Point;
use sortie_core::session::CombatSession;
use sortie_core::targeting::closest_enemy;
use sortie_test_utils::fixtures::{combat_config, strategies::arb_candidates};
use sortie_test_utils::{GameScreen, SimulatedGame};

fn session(game: &SimulatedGame) -> CombatSession {
    CombatSession::new(&combat_config("2-1", 1), game.now())
}

// =============================================================================
// Deduplication properties
// =============================================================================

proptest! {
    #[test]
    fn prop_output_is_pairwise_separated(candidates in arb_candidates(40)) {
        let out = deduplicate(&candidates, &[], MERGE_RADIUS);
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                prop_assert!(a.distance(*b) >= f64::from(MERGE_RADIUS), "{a} and {b} too close");
            }
        }
    }

    #[test]
    fn prop_output_avoids_blacklist(
        candidates in arb_candidates(40),
        blacklist in arb_candidates(5),
    ) {
        let out = deduplicate(&candidates, &blacklist, MERGE_RADIUS);
        for p in &out {
            for banned in &blacklist {
                prop_assert!(p.distance(*banned) > f64::from(MERGE_RADIUS));
            }
        }
    }

    #[test]
    fn prop_every_candidate_is_covered(candidates in arb_candidates(40)) {
        // Without a blacklist every raw detection is represented by a kept
        // point closer than the merge radius (or is itself kept).
        let out = deduplicate(&candidates, &[], MERGE_RADIUS);
        for c in &candidates {
            prop_assert!(out.iter().any(|k| k.distance(*c) < f64::from(MERGE_RADIUS)));
        }
    }
}

// =============================================================================
// Detection against the simulated game
// =============================================================================

#[test]
fn test_detection_aligns_variant_offset() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_enemy(Point::new(600, 300))
        .with_enemy(Point::new(100, 300));
    let ctl = game.controller();

    let contacts = detect_enemies(&ctl, &[]).unwrap();

    // The contact in the HUD column is ignored.
    assert_eq!(contacts, vec![Point::new(600, 300)]);
}

#[test]
fn test_fleet_found_directly() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_fleet(Point::new(400, 500));
    let mut ctl = game.controller();
    let mut session = session(&game);

    assert_eq!(locate_fleet(&mut ctl, &mut session).unwrap(), Point::new(400, 500));
    assert_eq!(game.swipes(), 0);
    assert_eq!(game.fleet_switches(), 0);
}

#[test]
fn test_fleet_found_after_scan() {
    // Marker starts above the screen; the first North swipe reveals it.
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_fleet(Point::new(400, 100));
    let mut ctl = game.controller();
    let mut session = session(&game);

    let location = locate_fleet(&mut ctl, &mut session).unwrap();

    assert_eq!(location, Point::new(400, 450));
    assert_eq!(game.swipes(), 1);
}

#[test]
fn test_two_fleet_refocus_once() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_fleet(Point::new(400, 500));
    let mut ctl = game.controller();
    let mut session = session(&game);
    session.two_fleet_mode = true;

    let location = locate_fleet(&mut ctl, &mut session).unwrap();

    assert_eq!(game.fleet_switches(), 2);
    assert!(!session.refocus_needed);
    assert_eq!(location, Point::new(640, 400));

    locate_fleet(&mut ctl, &mut session).unwrap();
    assert_eq!(game.fleet_switches(), 2);
}

#[test]
fn test_closest_enemy_picks_nearest() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_fleet(Point::new(400, 500))
        .with_enemy(Point::new(900, 200))
        .with_enemy(Point::new(500, 450));
    let mut ctl = game.controller();
    let mut session = session(&game);

    let target = closest_enemy(&mut ctl, &mut session, &[]).unwrap();
    assert_eq!(target, Point::new(500, 450));
}

#[test]
fn test_closest_enemy_scans_when_none_visible() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_fleet(Point::new(400, 500))
        .with_enemy(Point::new(400, -200));
    let mut ctl = game.controller();
    let mut session = session(&game);

    let target = closest_enemy(&mut ctl, &mut session, &[]).unwrap();

    // One North swipe of 175px moved the view down by 350px.
    assert_eq!(target, Point::new(400, 150));
    assert_eq!(game.swipes(), 1);
}

#[test]
fn test_cancelled_scan_stops() {
    let game = SimulatedGame::new().on_screen(GameScreen::Map);
    let cancel = Cancellation::new();
    cancel.cancel();
    let mut ctl = game.controller().with_cancellation(cancel);
    let mut session = session(&game);

    let err = closest_enemy(&mut ctl, &mut session, &[]).unwrap_err();
    assert!(matches!(err, BotError::Cancelled));
    assert_eq!(game.swipes(), 0);
}

#[test]
fn test_deadline_stops_fruitless_scan() {
    let game = SimulatedGame::new()
        .on_screen(GameScreen::Map)
        .with_swipe_limit(1_000);
    let deadline = game.now() + std::time::Duration::from_secs(30);
    let mut ctl = game
        .controller()
        .with_cancellation(Cancellation::with_deadline(deadline));
    let mut session = session(&game);

    // No contacts anywhere: only the deadline ends the search.
    let err = closest_enemy(&mut ctl, &mut session, &[]).unwrap_err();
    assert!(err.is_cancellation());
}
