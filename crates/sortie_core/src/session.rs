//! Combat configuration and the in-memory sortie session.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// A map identifier of the form `<region-or-E>-<number>`, e.g. `3-4` or `E-2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortieMap {
    region: String,
    number: u32,
}

impl SortieMap {
    /// Whether this is an event map (region `E`).
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.region == "E"
    }

    /// The region part (chapter number or `E`).
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The map number within the region.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }
}

impl FromStr for SortieMap {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BotError::InvalidConfig(format!("map '{s}' is not <region-or-E>-<number>"));
        let (region, number) = s.split_once('-').ok_or_else(invalid)?;
        let region_ok = region == "E" || (!region.is_empty() && region.chars().all(|c| c.is_ascii_digit()));
        if !region_ok {
            return Err(invalid());
        }
        let number = number.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self {
            region: region.to_string(),
            number,
        })
    }
}

impl TryFrom<String> for SortieMap {
    type Error = BotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortieMap> for String {
    fn from(map: SortieMap) -> Self {
        map.to_string()
    }
}

impl fmt::Display for SortieMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.region, self.number)
    }
}

/// Combat settings consumed by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Whether the combat cycle runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sortie into the hard-mode version of the map.
    #[serde(default)]
    pub hard_mode: bool,
    /// Map to sortie into.
    pub map: SortieMap,
    /// Trash kills needed before the boss spawns.
    pub kills_needed: u32,
    /// Clear trash with the second fleet.
    #[serde(default)]
    pub alt_clear_fleet: bool,
    /// Switch to the second fleet before engaging the boss.
    #[serde(default)]
    pub boss_fleet_switch: bool,
    /// Two fleets are deployed on the map.
    #[serde(default)]
    pub two_fleet: bool,
}

fn default_true() -> bool {
    true
}

impl CombatConfig {
    /// Create a configuration for `map` with all switches off.
    #[must_use]
    pub fn new(map: SortieMap, kills_needed: u32) -> Self {
        Self {
            enabled: true,
            hard_mode: false,
            map,
            kills_needed,
            alt_clear_fleet: false,
            boss_fleet_switch: false,
            two_fleet: false,
        }
    }

    /// Check values the types cannot express.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.kills_needed == 0 {
            return Err(BotError::InvalidConfig(
                "combat.kills_needed must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mutable state of the sortie in progress.
///
/// Created once with the state machine and mutated in place; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatSession {
    /// Trash kills still required before the boss spawns.
    pub kills_needed: u32,
    /// Hard-mode sortie.
    pub hard_mode: bool,
    /// Event map (event sub-tab must be opened).
    pub event_map: bool,
    /// Clear trash with the second fleet.
    pub alt_clear_fleet: bool,
    /// Switch fleets before the boss.
    pub boss_fleet_switch: bool,
    /// Two fleets are deployed.
    pub two_fleet_mode: bool,
    /// The next sortie resumes an interrupted one (skip map selection).
    pub resume_flag: bool,
    /// The camera must be re-centered on the fleet before localization.
    pub refocus_needed: bool,
    /// Earliest time the next sortie may start.
    pub next_eligible_time: Instant,
}

impl CombatSession {
    /// Create a session from configuration, eligible immediately.
    #[must_use]
    pub fn new(config: &CombatConfig, now: Instant) -> Self {
        Self {
            kills_needed: 0,
            hard_mode: config.hard_mode,
            event_map: config.map.is_event(),
            alt_clear_fleet: config.alt_clear_fleet,
            boss_fleet_switch: config.boss_fleet_switch,
            two_fleet_mode: config.two_fleet,
            resume_flag: false,
            refocus_needed: true,
            next_eligible_time: now,
        }
    }

    /// Whether a new sortie may start at `now`.
    #[must_use]
    pub fn is_eligible(&self, now: Instant) -> bool {
        now >= self.next_eligible_time
    }

    /// Push the next sortie back to `now + delay`.
    pub fn defer(&mut self, now: Instant, delay: Duration) {
        self.next_eligible_time = now + delay;
    }
}
