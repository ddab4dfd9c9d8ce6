//! A small reactive model of the game for driving the core in tests.
//!
//! The model keeps a camera over a map in world coordinates. Swipes move the
//! camera, taps are interpreted against the current screen, and template
//! queries answer from the model state. Screen coordinates are world
//! coordinates minus the camera offset.
//!
//! Enemies are reported as variant 1 only, drawn 10px below their anchor so
//! that the detection offset lands on the anchor again. The fleet marker is
//! drawn `(10, 175)` above and left of the fleet.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sortie_core::capability::{Clock, InputInjector, ScreenMatcher, Template};
use sortie_core::controller::Controller;
use sortie_core::error::Result;
use sortie_core::geometry::{Point, Region, SCREEN_HEIGHT, SCREEN_WIDTH};
use sortie_core::ui;

use crate::fixtures::{InstantPacer, ManualClock};

/// Where the battle-start prompt is drawn.
pub const BATTLE_START_REGION: Region = Region::new(1000, 610, 125, 50);
/// Where the ambush evade button is drawn.
pub const EVADE_REGION: Region = Region::new(1000, 500, 110, 40);
/// Where the result confirm button is drawn.
pub const CONFIRM_REGION: Region = Region::new(600, 600, 120, 40);
/// Where the in-battle overlay is drawn.
const IN_BATTLE_REGION: Region = Region::new(1150, 20, 100, 40);
/// Where the home marker is drawn.
const HOME_REGION: Region = Region::new(1100, 600, 120, 80);
/// Where morale icons are drawn on the battle-start prompt.
const MORALE_REGION: Region = Region::new(200, 200, 30, 30);
/// Where the "unable" indicator is drawn.
const UNABLE_REGION: Region = Region::new(560, 300, 160, 40);

/// Taps closer than this to an enemy anchor hit it.
const ENEMY_HIT_RADIUS: f64 = 20.0;
/// Taps closer than this to the boss marker hit it.
const BOSS_HIT_RADIUS: f64 = 40.0;
/// Frames a battle lasts once started.
const BATTLE_FRAMES: u32 = 2;

/// Kind of ambush triggered on the way to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambush {
    /// Evading succeeds.
    Evadable,
    /// Evading fails and a battle starts.
    Forced,
}

/// What a battle was fought against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Foe {
    Enemy(Point),
    Boss,
    Ambush,
}

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameScreen {
    /// Home screen with the build menu.
    Home,
    /// The sortie map.
    Map,
    /// Ambush prompt.
    Ambush(Ambush),
    /// Battle-start prompt.
    BattleStart,
    /// A battle is running.
    InBattle,
    /// Battle results.
    Results,
}

#[derive(Debug)]
struct Overlay {
    template: Template,
    region: Region,
    taps_left: u32,
    after: Option<Template>,
}

#[derive(Debug)]
struct GameState {
    screen: GameScreen,
    camera: Point,
    fleet: Point,
    enemies: Vec<Point>,
    unreachable: Vec<Point>,
    boss: Option<Point>,
    boss_similarity: f32,
    boss_blocked: u32,
    unable_shown: bool,
    ambushes: VecDeque<Ambush>,
    foe: Option<Foe>,
    frames_left: u32,
    morale_neutral: bool,
    morale_sad: bool,
    overlays: Vec<Overlay>,
    swipe_limit: usize,
    queries: Vec<String>,
    taps: Vec<Point>,
    swipes: usize,
    captures: usize,
    battles: Vec<Foe>,
    fleet_switches: u32,
}

impl GameState {
    fn to_screen(&self, world: Point) -> Point {
        Point::new(world.x - self.camera.x, world.y - self.camera.y)
    }

    fn to_world(&self, screen: Point) -> Point {
        Point::new(screen.x + self.camera.x, screen.y + self.camera.y)
    }

    fn on_screen(p: Point) -> bool {
        (0..SCREEN_WIDTH).contains(&p.x) && (0..SCREEN_HEIGHT).contains(&p.y)
    }

    fn visible(&self, overlay: &Overlay) -> bool {
        overlay
            .after
            .as_ref()
            .map_or(true, |after| !self.overlays.iter().any(|o| &o.template == after))
    }

    fn overlays_of<'a>(&'a self, template: &'a Template) -> impl Iterator<Item = Region> + 'a {
        self.overlays
            .iter()
            .filter(move |o| &o.template == template && self.visible(o))
            .map(|o| o.region)
    }

    fn overlay(&self, template: &Template) -> Option<Region> {
        self.overlays_of(template).next()
    }

    fn find(&self, template: &Template, similarity: f32) -> Option<Region> {
        if let Some(region) = self.overlay(template) {
            return Some(region);
        }
        match (self.screen, template) {
            (GameScreen::Home, Template::HomeMenuBuild) => Some(HOME_REGION),
            (GameScreen::Map, Template::FleetMarker) => {
                let marker = self.to_screen(self.fleet).offset(-10, -175);
                Self::on_screen(marker).then(|| Region::new(marker.x, marker.y, 30, 30))
            }
            (GameScreen::Map, Template::EnemyBoss) => {
                let boss = self.to_screen(self.boss?);
                (Self::on_screen(boss) && similarity <= self.boss_similarity)
                    .then(|| Region::new(boss.x, boss.y, 50, 50))
            }
            (GameScreen::Map, Template::Unable) => self.unable_shown.then_some(UNABLE_REGION),
            (GameScreen::Ambush(_), Template::Evade) => Some(EVADE_REGION),
            (GameScreen::BattleStart, Template::BattleStart) => Some(BATTLE_START_REGION),
            (GameScreen::BattleStart, Template::MoraleNeutral) => {
                self.morale_neutral.then_some(MORALE_REGION)
            }
            (GameScreen::BattleStart, Template::MoraleSad) => {
                self.morale_sad.then_some(MORALE_REGION)
            }
            (GameScreen::InBattle, Template::InBattle) => Some(IN_BATTLE_REGION),
            (GameScreen::Results, Template::BattleConfirm) => Some(CONFIRM_REGION),
            _ => None,
        }
    }

    fn find_all(&self, template: &Template) -> Vec<Point> {
        match (self.screen, template) {
            (GameScreen::Map, Template::EnemyFleet(1)) => self
                .enemies
                .iter()
                .chain(&self.unreachable)
                .map(|&e| self.to_screen(e))
                .filter(|&e| Self::on_screen(e))
                .map(|e| e.offset(0, 10))
                .collect(),
            _ => self.overlays_of(template).map(Region::origin).collect(),
        }
    }

    fn refresh(&mut self) {
        self.captures += 1;
        if self.screen == GameScreen::InBattle {
            self.frames_left = self.frames_left.saturating_sub(1);
            if self.frames_left == 0 {
                self.screen = GameScreen::Results;
            }
        }
    }

    fn tap_overlay(&mut self, point: Point) -> bool {
        let Some(idx) = self
            .overlays
            .iter()
            .position(|o| o.region.contains(point) && self.visible(o))
        else {
            return false;
        };
        self.overlays[idx].taps_left = self.overlays[idx].taps_left.saturating_sub(1);
        if self.overlays[idx].taps_left == 0 {
            self.overlays.remove(idx);
        }
        true
    }

    fn tap(&mut self, point: Point) {
        self.taps.push(point);
        if self.tap_overlay(point) {
            return;
        }
        if self.screen != GameScreen::Home && ui::NAV_BACK.contains(point) {
            self.screen = GameScreen::Home;
            return;
        }
        match self.screen {
            GameScreen::Home => {
                if ui::HOME_MENU_ATTACK.contains(point) {
                    self.screen = GameScreen::Map;
                }
            }
            GameScreen::Map => self.tap_map(point),
            GameScreen::Ambush(kind) => {
                if EVADE_REGION.contains(point) {
                    match kind {
                        Ambush::Evadable => self.screen = GameScreen::Map,
                        Ambush::Forced => {
                            self.foe = Some(Foe::Ambush);
                            self.screen = GameScreen::BattleStart;
                        }
                    }
                }
            }
            GameScreen::BattleStart => {
                if BATTLE_START_REGION.contains(point) {
                    self.frames_left = BATTLE_FRAMES;
                    self.screen = GameScreen::InBattle;
                }
            }
            GameScreen::InBattle => {}
            GameScreen::Results => {
                if CONFIRM_REGION.contains(point) {
                    self.finish_battle();
                }
            }
        }
    }

    fn tap_map(&mut self, point: Point) {
        self.unable_shown = false;
        if ui::SWITCH_FLEET.contains(point) {
            self.fleet_switches += 1;
            self.camera = self.fleet.offset(-640, -400);
            return;
        }
        let world = self.to_world(point);
        if let Some(boss) = self.boss {
            if boss.distance(world) < BOSS_HIT_RADIUS {
                if self.boss_blocked > 0 {
                    self.boss_blocked -= 1;
                    self.unable_shown = true;
                } else {
                    self.foe = Some(Foe::Boss);
                    self.screen = GameScreen::BattleStart;
                }
                return;
            }
        }
        if self.unreachable.iter().any(|u| u.distance(world) < ENEMY_HIT_RADIUS) {
            return;
        }
        let Some(&enemy) = self
            .enemies
            .iter()
            .find(|e| e.distance(world) < ENEMY_HIT_RADIUS)
        else {
            return;
        };
        if let Some(kind) = self.ambushes.pop_front() {
            self.screen = GameScreen::Ambush(kind);
            return;
        }
        self.foe = Some(Foe::Enemy(enemy));
        self.screen = GameScreen::BattleStart;
    }

    fn finish_battle(&mut self) {
        self.screen = GameScreen::Map;
        let Some(foe) = self.foe.take() else {
            return;
        };
        match foe {
            Foe::Enemy(enemy) => {
                self.enemies.retain(|&e| e != enemy);
                self.fleet = enemy;
            }
            Foe::Boss => {
                if let Some(boss) = self.boss.take() {
                    self.fleet = boss;
                }
            }
            Foe::Ambush => {}
        }
        self.battles.push(foe);
    }

    fn swipe(&mut self, from: Point, to: Point) {
        self.swipes += 1;
        assert!(
            self.swipes <= self.swipe_limit,
            "simulated game: more than {} swipes, the scan is not converging",
            self.swipe_limit
        );
        self.camera = self.camera.offset(from.x - to.x, from.y - to.y);
    }
}

/// A simulated game shared between the screen and input handles.
///
/// Builder methods configure the map; [`SimulatedGame::controller`] wires a
/// [`Controller`] to it; the query methods inspect what happened.
#[derive(Debug, Clone)]
pub struct SimulatedGame {
    state: Arc<Mutex<GameState>>,
    clock: ManualClock,
}

impl Default for SimulatedGame {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGame {
    /// A game on the home screen with the fleet at `(400, 500)`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GameState {
                screen: GameScreen::Home,
                camera: Point::new(0, 0),
                fleet: Point::new(400, 500),
                enemies: Vec::new(),
                unreachable: Vec::new(),
                boss: None,
                boss_similarity: 1.0,
                boss_blocked: 0,
                unable_shown: false,
                ambushes: VecDeque::new(),
                foe: None,
                frames_left: 0,
                morale_neutral: false,
                morale_sad: false,
                overlays: Vec::new(),
                swipe_limit: 64,
                queries: Vec::new(),
                taps: Vec::new(),
                swipes: 0,
                captures: 0,
                battles: Vec::new(),
                fleet_switches: 0,
            })),
            clock: ManualClock::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start on the given screen.
    #[must_use]
    pub fn on_screen(self, screen: GameScreen) -> Self {
        self.lock().screen = screen;
        self
    }

    /// Place the fleet (world coordinates).
    #[must_use]
    pub fn with_fleet(self, at: Point) -> Self {
        self.lock().fleet = at;
        self
    }

    /// Add a reachable enemy contact.
    #[must_use]
    pub fn with_enemy(self, at: Point) -> Self {
        self.lock().enemies.push(at);
        self
    }

    /// Add a contact that taps never reach.
    #[must_use]
    pub fn with_unreachable_enemy(self, at: Point) -> Self {
        self.lock().unreachable.push(at);
        self
    }

    /// Place the boss.
    #[must_use]
    pub fn with_boss(self, at: Point) -> Self {
        self.lock().boss = Some(at);
        self
    }

    /// Only report the boss at or below `similarity`.
    #[must_use]
    pub fn with_boss_similarity(self, similarity: f32) -> Self {
        self.lock().boss_similarity = similarity;
        self
    }

    /// Reject the next `times` taps on the boss with the "unable" indicator.
    #[must_use]
    pub fn with_boss_blocked(self, times: u32) -> Self {
        self.lock().boss_blocked = times;
        self
    }

    /// Queue an ambush for the next approach to a contact.
    #[must_use]
    pub fn with_ambush(self, kind: Ambush) -> Self {
        self.lock().ambushes.push_back(kind);
        self
    }

    /// Show morale icons on the battle-start prompt.
    #[must_use]
    pub fn with_morale(self, neutral: bool, sad: bool) -> Self {
        let mut state = self.lock();
        state.morale_neutral = neutral;
        state.morale_sad = sad;
        drop(state);
        self
    }

    /// Change the morale icons of a running game.
    pub fn set_morale(&self, neutral: bool, sad: bool) {
        let mut state = self.lock();
        state.morale_neutral = neutral;
        state.morale_sad = sad;
    }

    /// Show `template` at `region` on every screen until tapped `taps` times.
    #[must_use]
    pub fn with_overlay(self, template: Template, region: Region, taps: u32) -> Self {
        self.lock().overlays.push(Overlay {
            template,
            region,
            taps_left: taps,
            after: None,
        });
        self
    }

    /// Like [`SimulatedGame::with_overlay`], but hidden while any overlay of
    /// `after` is still shown.
    #[must_use]
    pub fn with_overlay_after(
        self,
        after: Template,
        template: Template,
        region: Region,
        taps: u32,
    ) -> Self {
        self.lock().overlays.push(Overlay {
            template,
            region,
            taps_left: taps,
            after: Some(after),
        });
        self
    }

    /// Whether `template` is currently shown as an overlay.
    #[must_use]
    pub fn overlay_shown(&self, template: &Template) -> bool {
        self.lock().overlay(template).is_some()
    }

    /// Panic after more than `limit` swipes.
    #[must_use]
    pub fn with_swipe_limit(self, limit: usize) -> Self {
        self.lock().swipe_limit = limit;
        self
    }

    /// A controller wired to this game, with an instant pacer driving the
    /// game's manual clock.
    #[must_use]
    pub fn controller(&self) -> Controller {
        Controller::new(
            SimScreen { game: self.clone() },
            SimInput { game: self.clone() },
            InstantPacer::new(self.clock.clone()),
            self.clock.clone(),
        )
    }

    /// The game's clock.
    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// The current screen.
    #[must_use]
    pub fn screen(&self) -> GameScreen {
        self.lock().screen
    }

    /// Remaining reachable enemies (world coordinates).
    #[must_use]
    pub fn enemies(&self) -> Vec<Point> {
        self.lock().enemies.clone()
    }

    /// Whether the boss is still on the map.
    #[must_use]
    pub fn boss_alive(&self) -> bool {
        self.lock().boss.is_some()
    }

    /// Battles fought so far.
    #[must_use]
    pub fn battles_fought(&self) -> usize {
        self.lock().battles.len()
    }

    /// Battles fought against ambushes.
    #[must_use]
    pub fn ambush_battles(&self) -> usize {
        self.lock()
            .battles
            .iter()
            .filter(|b| **b == Foe::Ambush)
            .count()
    }

    /// Every tap, in screen coordinates.
    #[must_use]
    pub fn taps(&self) -> Vec<Point> {
        self.lock().taps.clone()
    }

    /// Taps that landed within `radius` of `at` (screen coordinates).
    #[must_use]
    pub fn taps_near(&self, at: Point, radius: f64) -> usize {
        self.lock()
            .taps
            .iter()
            .filter(|t| t.distance(at) < radius)
            .count()
    }

    /// Taps inside `region`.
    #[must_use]
    pub fn taps_in(&self, region: Region) -> usize {
        self.lock().taps.iter().filter(|t| region.contains(**t)).count()
    }

    /// Asset names of every template queried.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    /// Whether `template` was ever queried.
    #[must_use]
    pub fn queried(&self, template: &Template) -> bool {
        let name = template.asset_name();
        self.lock().queries.iter().any(|q| *q == name)
    }

    /// Swipes issued so far.
    #[must_use]
    pub fn swipes(&self) -> usize {
        self.lock().swipes
    }

    /// Frames captured so far.
    #[must_use]
    pub fn captures(&self) -> usize {
        self.lock().captures
    }

    /// Fleet switch taps so far.
    #[must_use]
    pub fn fleet_switches(&self) -> u32 {
        self.lock().fleet_switches
    }

    /// The current time of the game's clock.
    #[must_use]
    pub fn now(&self) -> std::time::Instant {
        self.clock.now()
    }
}

/// Screen handle of a [`SimulatedGame`].
#[derive(Debug)]
pub struct SimScreen {
    game: SimulatedGame,
}

impl ScreenMatcher for SimScreen {
    fn refresh(&mut self) -> Result<()> {
        self.game.lock().refresh();
        Ok(())
    }

    fn find(&self, template: &Template, similarity: f32) -> Result<Option<Region>> {
        let mut state = self.game.lock();
        state.queries.push(template.asset_name().into_owned());
        Ok(state.find(template, similarity))
    }

    fn find_all(&self, template: &Template, _similarity: f32) -> Result<Vec<Point>> {
        let mut state = self.game.lock();
        state.queries.push(template.asset_name().into_owned());
        Ok(state.find_all(template))
    }
}

/// Input handle of a [`SimulatedGame`].
#[derive(Debug)]
pub struct SimInput {
    game: SimulatedGame,
}

impl InputInjector for SimInput {
    fn tap(&mut self, point: Point) -> Result<()> {
        self.game.lock().tap(point);
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point, _duration_ms: u32) -> Result<()> {
        self.game.lock().swipe(from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_moves_contacts_like_the_tracked_shift() {
        use sortie_core::geometry::Direction;

        let game = SimulatedGame::new()
            .on_screen(GameScreen::Map)
            .with_enemy(Point::new(700, 400));
        let before = game.lock().to_screen(Point::new(700, 400));
        for direction in Direction::COMPASS {
            let (from, to) = direction.swipe(100);
            game.lock().swipe(from, to);
            let after = game.lock().to_screen(Point::new(700, 400));
            let tracked = direction.shift(before, 100);
            assert_eq!(after, tracked, "{direction:?}");
            game.lock().camera = Point::new(0, 0);
        }
    }

    #[test]
    fn test_tap_enemy_opens_battle_prompt() {
        let game = SimulatedGame::new()
            .on_screen(GameScreen::Map)
            .with_enemy(Point::new(700, 400));
        game.lock().tap(Point::new(702, 401));
        assert_eq!(game.screen(), GameScreen::BattleStart);
    }
}
