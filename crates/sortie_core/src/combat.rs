//! The sortie state machine.
//!
//! A sortie moves through `Idle → Navigating → TrashClearing →
//! BossEngagement → Returning → Idle`. Low morale before any battle sends the
//! machine home and back to `Idle`, with the session flagged for resumption
//! so the next sortie continues on the same map.
//!
//! Polling loops in here have no deadline. They re-capture until the UI
//! converges and pass through the controller's cancellation checkpoint on
//! every iteration.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::capability::{StatsRecorder, Template, DEFAULT_SIMILARITY};
use crate::controller::Controller;
use crate::cycle::Cycle;
use crate::detection::MERGE_RADIUS;
use crate::error::Result;
use crate::fleet::{
    compass_pass, refocus_fleet, switch_fleet, CompassScan, LOCATOR_X_DISTANCE,
    LOCATOR_Y_DISTANCE,
};
use crate::geometry::Point;
use crate::morale::{morale_gate, MoraleVerdict};
use crate::session::{CombatConfig, CombatSession};
use crate::targeting::{closest_enemy, nearest_contact};
use crate::ui;

/// Failed taps on one contact before it is blacklisted.
pub const MAX_NAVIGATION_ATTEMPTS: u32 = 3;

/// Cooldown after a completed sortie.
pub const SORTIE_COOLDOWN: Duration = Duration::from_secs(10);

/// Similarity for the map tile on the chapter screen.
const MAP_TILE_SIMILARITY: f32 = 0.85;
/// Similarity for the battle overlay and result screens.
const BATTLE_UI_SIMILARITY: f32 = 0.85;
/// Similarity for the auto-battle acknowledgement dialog.
const I_KNOW_SIMILARITY: f32 = 0.8;

/// First similarity of the boss search.
const BOSS_START_SIMILARITY: f32 = 0.80;
/// Similarity dropped after every failed boss search round.
const BOSS_SIMILARITY_STEP: f32 = 0.015;
/// Similarity used to re-locate a boss that could not be targeted.
const BOSS_FALLBACK_SIMILARITY: f32 = 0.75;
/// Tap offset from the boss marker, clear of a fleet icon sitting on it.
const BOSS_TAP_OFFSET: (i32, i32) = (25, 5);

/// Phase of the sortie state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the next eligible sortie.
    Idle,
    /// Opening the map from the home screen.
    Navigating,
    /// Fighting trash fleets until the boss spawns.
    TrashClearing,
    /// Searching for and fighting the boss.
    BossEngagement,
    /// Recording the sortie and heading home.
    Returning,
}

/// How a battle phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase finished its battles.
    Complete,
    /// Morale was too low; the sortie is deferred and will resume.
    Deferred,
}

/// Counts consecutive taps on the same contact.
#[derive(Debug, Default)]
struct NavigationAttempts {
    last: Option<Point>,
    count: u32,
}

impl NavigationAttempts {
    /// Record a tap on `target` and return how many taps in a row went to it.
    fn record(&mut self, target: Point) -> u32 {
        match self.last {
            Some(prev) if prev.distance(target) < f64::from(MERGE_RADIUS) => self.count += 1,
            _ => self.count = 1,
        }
        self.last = Some(target);
        self.count
    }
}

/// Orchestrates sorties: navigation, trash, boss and the trip home.
#[derive(Debug)]
pub struct CombatStateMachine {
    config: CombatConfig,
    session: CombatSession,
    phase: Phase,
}

impl CombatStateMachine {
    /// Create a machine in `Idle`, eligible to sortie at `now`.
    pub fn new(config: CombatConfig, now: Instant) -> Result<Self> {
        config.validate()?;
        let session = CombatSession::new(&config, now);
        Ok(Self {
            config,
            session,
            phase: Phase::Idle,
        })
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The session state.
    #[must_use]
    pub const fn session(&self) -> &CombatSession {
        &self.session
    }

    /// Mutable access to the session state.
    pub fn session_mut(&mut self) -> &mut CombatSession {
        &mut self.session
    }

    /// The combat configuration.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Whether the `Idle → Navigating` guard passes at `now`.
    #[must_use]
    pub fn should_sortie(&self, now: Instant) -> bool {
        self.config.enabled && self.session.is_eligible(now)
    }

    /// Run one full sortie, or return `false` without touching the device
    /// when no sortie is due.
    ///
    /// On a hard error the machine falls back to `Idle` and the error
    /// propagates.
    pub fn run_sortie(
        &mut self,
        ctl: &mut Controller,
        stats: &mut dyn StatsRecorder,
    ) -> Result<bool> {
        if !self.should_sortie(ctl.now()) {
            return Ok(false);
        }
        if let Err(err) = self.sortie(ctl, stats) {
            self.enter(Phase::Idle);
            return Err(err);
        }
        Ok(true)
    }

    fn sortie(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<()> {
        self.enter(Phase::Navigating);
        self.navigate(ctl)?;

        self.enter(Phase::TrashClearing);
        if self.clear_trash(ctl)? == PhaseOutcome::Deferred {
            return self.abandon(ctl);
        }

        self.enter(Phase::BossEngagement);
        if self.clear_boss(ctl)? == PhaseOutcome::Deferred {
            return self.abandon(ctl);
        }

        self.enter(Phase::Returning);
        self.finish_sortie(ctl, stats)?;
        self.enter(Phase::Idle);
        Ok(())
    }

    fn abandon(&mut self, ctl: &mut Controller) -> Result<()> {
        info!("Sortie deferred. Navigating back home.");
        return_home(ctl)?;
        self.enter(Phase::Idle);
        Ok(())
    }

    /// Open the configured map from the home screen.
    ///
    /// A resumed sortie only taps the attack menu and skips map selection.
    pub fn navigate(&mut self, ctl: &mut Controller) -> Result<()> {
        info!(map = %self.config.map, resume = self.session.resume_flag, "Navigating to map.");
        ctl.touch_region(ui::HOME_MENU_ATTACK)?;
        if self.session.resume_flag {
            return Ok(());
        }

        self.session.kills_needed = self.config.kills_needed;
        if self.session.event_map {
            ctl.touch_region(ui::EVENT_MAP_TAB)?;
        }
        if self.session.hard_mode {
            ctl.refresh()?;
            ctl.find_and_touch(&Template::MapMenuHard, DEFAULT_SIMILARITY)?;
        }
        ctl.sleep(1.0);
        ctl.refresh()?;
        let tile = Template::MapTile(self.config.map.to_string());
        if !ctl.find_and_touch(&tile, MAP_TILE_SIMILARITY)? {
            warn!(%tile, "Map tile not found.");
        }
        ctl.touch_region(ui::MAP_GO_1)?;
        ctl.touch_region(ui::UNABLE_SUBMARINE)?;
        ctl.touch_region(ui::MAP_GO_2)?;
        if self.session.alt_clear_fleet {
            info!("Alternate clearing fleet enabled, switching to 2nd fleet to clear trash.");
            switch_fleet(ctl)?;
            self.session.refocus_needed = false;
        }
        ctl.sleep(2.0);
        Ok(())
    }

    /// Re-enter an interrupted sortie through the in-map attack button.
    fn resume(&mut self, ctl: &mut Controller) -> Result<()> {
        info!("Resuming previous sortie.");
        self.session.resume_flag = false;
        ctl.refresh()?;
        ctl.find_and_touch(&Template::Attack, DEFAULT_SIMILARITY)?;
        Ok(())
    }

    /// Fight trash fleets until the boss spawns.
    pub fn clear_trash(&mut self, ctl: &mut Controller) -> Result<PhaseOutcome> {
        while self.session.kills_needed > 0 {
            ctl.checkpoint()?;
            let mut blacklist: Vec<Point> = Vec::new();
            let mut attempts = NavigationAttempts::default();
            let mut forced_ambush = false;
            if self.session.resume_flag {
                self.resume(ctl)?;
            }

            loop {
                ctl.checkpoint()?;
                ctl.refresh()?;
                if ctl.exists(&Template::BattleStart, DEFAULT_SIMILARITY)? {
                    break;
                }
                if ctl.find_and_touch(&Template::Evade, DEFAULT_SIMILARITY)? {
                    if evade_failed(ctl)? {
                        warn!("Ambush could not be evaded.");
                        forced_ambush = true;
                    } else {
                        info!("Successfully avoided ambush.");
                    }
                } else if ctl.find_and_touch(&Template::ItemsReceived, DEFAULT_SIMILARITY)? {
                    debug!("dismissed item pickup");
                } else {
                    let target = self.next_target(ctl, &mut blacklist, &mut attempts)?;
                    info!(%target, "Navigating to enemy fleet.");
                    ctl.touch(target)?;
                    self.session.refocus_needed = true;
                    ctl.sleep(3.0);
                }
            }

            if self.gate(ctl)? != MoraleVerdict::Proceed {
                return Ok(PhaseOutcome::Deferred);
            }
            self.conduct_battle(ctl)?;
            if !forced_ambush {
                self.session.kills_needed -= 1;
            }
            info!(kills_left = self.session.kills_needed, "Kills left for boss to spawn.");
        }
        Ok(PhaseOutcome::Complete)
    }

    /// Pick the next contact to tap, blacklisting one that keeps failing.
    fn next_target(
        &mut self,
        ctl: &mut Controller,
        blacklist: &mut Vec<Point>,
        attempts: &mut NavigationAttempts,
    ) -> Result<Point> {
        let target = closest_enemy(ctl, &mut self.session, blacklist)?;
        if attempts.record(target) <= MAX_NAVIGATION_ATTEMPTS {
            return Ok(target);
        }
        warn!(%target, "Enemy unreachable, blacklisting.");
        blacklist.push(target);
        let retarget = closest_enemy(ctl, &mut self.session, blacklist)?;
        attempts.record(retarget);
        Ok(retarget)
    }

    fn gate(&mut self, ctl: &mut Controller) -> Result<MoraleVerdict> {
        let verdict = morale_gate(ctl, &mut self.session)?;
        if verdict != MoraleVerdict::Proceed {
            self.session.resume_flag = true;
        }
        Ok(verdict)
    }

    /// Start the battle on screen and click through to the map.
    pub fn conduct_battle(&mut self, ctl: &mut Controller) -> Result<()> {
        info!("Starting battle.");
        ctl.find_and_touch(&Template::BattleStart, DEFAULT_SIMILARITY)?;
        ctl.refresh()?;
        while !ctl.exists(&Template::InBattle, BATTLE_UI_SIMILARITY)? {
            ctl.checkpoint()?;
            if ctl.exists(&Template::NotAutobattle, BATTLE_UI_SIMILARITY)? {
                info!("Enabling auto battle.");
                ctl.touch_region(ui::AUTOBATTLE_TOGGLE)?;
                ctl.sleep(1.0);
                ctl.refresh()?;
                ctl.find_and_touch(&Template::IKnow, I_KNOW_SIMILARITY)?;
            }
            ctl.refresh()?;
        }
        while ctl.exists(&Template::InBattle, BATTLE_UI_SIMILARITY)? {
            ctl.checkpoint()?;
            ctl.refresh()?;
        }
        while !ctl.find_and_touch(&Template::BattleConfirm, BATTLE_UI_SIMILARITY)? {
            ctl.checkpoint()?;
            ctl.touch_region(ui::RESULT_SKIP)?;
            ctl.refresh()?;
        }
        info!("Battle complete.");
        ctl.sleep(1.5);
        ctl.refresh()?;
        if ctl.find_and_touch(&Template::Confirm, DEFAULT_SIMILARITY)? {
            info!("Dismissing urgent notification.");
            ctl.refresh()?;
        }
        self.session.refocus_needed = true;
        Ok(())
    }

    /// Find the boss, reach it and defeat it.
    pub fn clear_boss(&mut self, ctl: &mut Controller) -> Result<PhaseOutcome> {
        if self.session.resume_flag {
            self.resume(ctl)?;
        }
        if self.session.boss_fleet_switch {
            info!("Switching to 2nd fleet to kill boss.");
            switch_fleet(ctl)?;
        }

        ctl.refresh()?;
        while !ctl.exists(&Template::BattleStart, DEFAULT_SIMILARITY)? {
            ctl.checkpoint()?;
            let boss = locate_boss(ctl)?;
            info!(%boss, "Boss found.");
            ctl.touch(boss.offset(BOSS_TAP_OFFSET.0, BOSS_TAP_OFFSET.1))?;
            self.session.refocus_needed = true;
            ctl.refresh()?;

            let retargeted = ctl.exists(&Template::Unable, DEFAULT_SIMILARITY)?;
            if retargeted {
                self.retarget_near_boss(ctl)?;
            }

            ctl.sleep(3.0);
            ctl.refresh()?;
            if ctl.find_and_touch(&Template::Evade, DEFAULT_SIMILARITY)? {
                if evade_failed(ctl)? {
                    warn!("Ambush could not be evaded.");
                    if self.gate(ctl)? != MoraleVerdict::Proceed {
                        return Ok(PhaseOutcome::Deferred);
                    }
                    self.conduct_battle(ctl)?;
                }
                if !self.session.two_fleet_mode {
                    refocus_fleet(ctl)?;
                }
            } else if retargeted && ctl.exists(&Template::BattleStart, DEFAULT_SIMILARITY)? {
                info!("Engaging fleet blocking the boss.");
                if self.gate(ctl)? != MoraleVerdict::Proceed {
                    return Ok(PhaseOutcome::Deferred);
                }
                self.conduct_battle(ctl)?;
            }
            ctl.refresh()?;
        }

        if self.gate(ctl)? != MoraleVerdict::Proceed {
            return Ok(PhaseOutcome::Deferred);
        }
        self.conduct_battle(ctl)?;
        Ok(PhaseOutcome::Complete)
    }

    /// The boss could not be targeted: tap the contact nearest to it, or the
    /// contact nearest to the fleet when that is rejected too.
    fn retarget_near_boss(&mut self, ctl: &mut Controller) -> Result<()> {
        warn!("Unable to target boss, retargeting.");
        let mut scan = CompassScan::new(LOCATOR_X_DISTANCE, LOCATOR_Y_DISTANCE);
        let anchor = compass_pass(ctl, &Template::EnemyBoss, BOSS_FALLBACK_SIMILARITY, &mut scan)?;
        if let Some(anchor) = anchor {
            if let Some(contact) = nearest_contact(ctl, anchor.origin(), &[])? {
                debug!(%contact, "tapping contact nearest to boss");
                ctl.touch(contact)?;
                ctl.refresh()?;
                if !ctl.exists(&Template::Unable, DEFAULT_SIMILARITY)? {
                    return Ok(());
                }
            }
        }
        let contact = closest_enemy(ctl, &mut self.session, &[])?;
        debug!(%contact, "tapping contact nearest to fleet");
        ctl.touch(contact)
    }

    /// Record the sortie, head home and start the cooldown.
    pub fn finish_sortie(
        &mut self,
        ctl: &mut Controller,
        stats: &mut dyn StatsRecorder,
    ) -> Result<()> {
        stats.increment_combat_done();
        info!(sorties = stats.combat_done(), "Sortie complete. Navigating back home.");
        return_home(ctl)?;
        self.session.defer(ctl.now(), SORTIE_COOLDOWN);
        Ok(())
    }
}

impl Cycle for CombatStateMachine {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool> {
        self.run_sortie(ctl, stats)
    }
}

/// Locate the boss, relaxing the similarity after every fruitless round.
///
/// Each round captures a fresh frame and runs one compass pass. The
/// similarity keeps dropping until the boss is seen.
pub fn locate_boss(ctl: &mut Controller) -> Result<Point> {
    let mut similarity = BOSS_START_SIMILARITY;
    loop {
        ctl.checkpoint()?;
        ctl.refresh()?;
        let mut scan = CompassScan::new(LOCATOR_X_DISTANCE, LOCATOR_Y_DISTANCE);
        if let Some(region) = compass_pass(ctl, &Template::EnemyBoss, similarity, &mut scan)? {
            return Ok(region.origin());
        }
        similarity -= BOSS_SIMILARITY_STEP;
        debug!(similarity, "boss not found, relaxing similarity");
    }
}

/// After tapping evade: pause, re-capture and report whether the battle
/// started anyway.
fn evade_failed(ctl: &mut Controller) -> Result<bool> {
    ctl.sleep(2.0);
    ctl.refresh()?;
    ctl.exists(&Template::BattleStart, DEFAULT_SIMILARITY)
}

/// Tap back until the home screen shows.
pub fn return_home(ctl: &mut Controller) -> Result<()> {
    ctl.refresh()?;
    while !ctl.exists(&Template::HomeMenuBuild, DEFAULT_SIMILARITY)? {
        ctl.checkpoint()?;
        ctl.touch_region(ui::NAV_BACK)?;
        ctl.refresh()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_count_same_contact() {
        let mut attempts = NavigationAttempts::default();
        assert_eq!(attempts.record(Point::new(500, 300)), 1);
        assert_eq!(attempts.record(Point::new(503, 302)), 2);
        assert_eq!(attempts.record(Point::new(505, 300)), 3);
        assert_eq!(attempts.record(Point::new(800, 300)), 1);
    }
}
