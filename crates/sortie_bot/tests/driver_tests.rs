//! Driver ordering, cancellation and error propagation.

use std::sync::{Arc, Mutex};

use sortie_bot::{BotConfig, Driver, Stats};
use sortie_core::capability::StatsRecorder;
use sortie_core::controller::Controller;
use sortie_core::cycle::Cycle;
use sortie_core::error::{BotError, Result};
use sortie_test_utils::SimulatedGame;

type Log = Arc<Mutex<Vec<&'static str>>>;

/// Records every call; cancels the run after `stop_after` calls.
struct ScriptedCycle {
    name: &'static str,
    log: Log,
    did_work: bool,
    stop_after: Option<usize>,
    fail: bool,
}

impl ScriptedCycle {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            did_work: false,
            stop_after: None,
            fail: false,
        }
    }
}

impl Cycle for ScriptedCycle {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool> {
        let mut log = self.log.lock().unwrap();
        log.push(self.name);
        if self.fail {
            return Err(BotError::MissingTemplate("scripted".to_string()));
        }
        if self.stop_after.is_some_and(|n| log.len() >= n) {
            ctl.cancellation().cancel();
        }
        if self.did_work {
            stats.increment_combat_done();
        }
        Ok(self.did_work)
    }
}

#[test]
fn test_cycles_run_in_order_until_cancelled() {
    let game = SimulatedGame::new();
    let mut ctl = game.controller();
    let log: Log = Arc::default();

    let mut last = ScriptedCycle::new("missions", &log);
    last.stop_after = Some(8);
    let mut combat = ScriptedCycle::new("combat", &log);
    combat.did_work = true;
    let cycles: Vec<Box<dyn Cycle>> = vec![
        Box::new(ScriptedCycle::new("commissions", &log)),
        Box::new(combat),
        Box::new(ScriptedCycle::new("retirement", &log)),
        Box::new(last),
    ];
    let mut driver = Driver::new(cycles, Stats::new(game.now()));

    driver.run(&mut ctl).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        [
            "commissions", "combat", "retirement", "missions",
            "commissions", "combat", "retirement", "missions",
        ]
    );
    assert_eq!(driver.stats().combat_done, 2);
}

#[test]
fn test_idle_iteration_pauses() {
    let game = SimulatedGame::new();
    let mut ctl = game.controller();
    let log: Log = Arc::default();
    let mut only = ScriptedCycle::new("missions", &log);
    only.stop_after = Some(2);
    let cycles: Vec<Box<dyn Cycle>> = vec![Box::new(only)];
    let mut driver = Driver::new(cycles, Stats::new(game.now()));

    let start = game.now();
    driver.run(&mut ctl).unwrap();

    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(game.now() > start, "an idle iteration waits before polling again");
}

#[test]
fn test_hard_error_aborts() {
    let game = SimulatedGame::new();
    let mut ctl = game.controller();
    let log: Log = Arc::default();
    let mut failing = ScriptedCycle::new("combat", &log);
    failing.fail = true;
    let cycles: Vec<Box<dyn Cycle>> = vec![
        Box::new(failing),
        Box::new(ScriptedCycle::new("missions", &log)),
    ];
    let mut driver = Driver::new(cycles, Stats::new(game.now()));

    let err = driver.run(&mut ctl).unwrap_err();

    assert!(matches!(err, BotError::MissingTemplate(_)));
    assert_eq!(*log.lock().unwrap(), ["combat"]);
}

#[test]
fn test_from_config_builds_enabled_cycles_in_order() {
    let config = BotConfig::from_ron_str(
        r#"(
            combat: (map: "3-4", kills_needed: 3),
            commissions: (enabled: true),
            missions: (enabled: true),
            retirement: (enabled: true, retire_cycle: 2),
        )"#,
    )
    .unwrap();
    let driver = Driver::from_config(&config, std::time::Instant::now()).unwrap();
    assert_eq!(
        driver.cycle_names(),
        ["commissions", "combat", "retirement", "missions"]
    );

    let combat_only =
        BotConfig::from_ron_str(r#"(combat: (map: "E-1", kills_needed: 2))"#).unwrap();
    let driver = Driver::from_config(&combat_only, std::time::Instant::now()).unwrap();
    assert_eq!(driver.cycle_names(), ["combat"]);
}

#[test]
fn test_from_config_rejects_nothing_enabled() {
    let config = BotConfig::from_ron_str(
        r#"(combat: (enabled: false, map: "3-4", kills_needed: 3))"#,
    )
    .unwrap();
    let err = Driver::from_config(&config, std::time::Instant::now()).err().unwrap();
    assert!(matches!(err, BotError::InvalidConfig(_)));
}

#[test]
fn test_iteration_runs_a_full_sortie() {
    let game = SimulatedGame::new()
        .with_enemy(sortie_core::geometry::Point::new(600, 500))
        .with_enemy(sortie_core::geometry::Point::new(800, 450))
        .with_boss(sortie_core::geometry::Point::new(900, 250));
    let mut ctl = game.controller();
    let config = BotConfig::from_ron_str(
        r#"(combat: (map: "3-4", kills_needed: 2), missions: (enabled: true))"#,
    )
    .unwrap();
    let mut driver = Driver::from_config(&config, game.now()).unwrap();

    assert!(driver.run_iteration(&mut ctl).unwrap());
    assert_eq!(driver.stats().combat_done, 1);
    assert!(!game.boss_alive());

    // Combat is cooling down and no mission is finished.
    assert!(!driver.run_iteration(&mut ctl).unwrap());
    assert_eq!(driver.stats().combat_done, 1);
}
