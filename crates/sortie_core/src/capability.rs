//! Capabilities the core consumes but does not implement.
//!
//! The core never talks to a device directly. Screen capture and template
//! matching, input injection, pacing delays and the wall clock are all
//! injected through the traits below, which keeps the orchestration logic
//! deterministic and lets tests drive it with a simulated game.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::geometry::{Point, Region};

/// Default similarity for single-template queries.
pub const DEFAULT_SIMILARITY: f32 = 0.95;

/// Logical identifier of a grayscale reference image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Template {
    /// Enemy contact, one of four visual variants (1-4).
    EnemyFleet(u8),
    /// Boss contact marker.
    EnemyBoss,
    /// The green marker above the player's active fleet.
    FleetMarker,
    /// Battle-start prompt shown when the fleet engages.
    BattleStart,
    /// Confirm button on the battle results screen.
    BattleConfirm,
    /// Overlay visible while a battle is running.
    InBattle,
    /// Indicator that auto-battle is switched off.
    NotAutobattle,
    /// Acknowledgement dialog after toggling auto-battle.
    IKnow,
    /// Ambush evade prompt.
    Evade,
    /// Item pickup toast.
    ItemsReceived,
    /// "Unable to target" indicator.
    Unable,
    /// In-map attack button used when resuming a sortie.
    Attack,
    /// Generic confirm button (urgent notifications).
    Confirm,
    /// Neutral morale icon.
    MoraleNeutral,
    /// Sad morale icon.
    MoraleSad,
    /// Build menu entry on the home screen, used as the home marker.
    HomeMenuBuild,
    /// Hard-mode toggle in the map menu.
    MapMenuHard,
    /// A map tile on the chapter screen, e.g. `3-4` or `E-2`.
    MapTile(String),
    /// Home notification for finished commissions.
    CommissionNotification,
    /// A finished commission in the commission list.
    CommissionComplete,
    /// Button opening the commission list.
    CommissionGo,
    /// A commission that is currently running.
    CommissionInAction,
    /// A selectable commission.
    CommissionSelect,
    /// Fleet recommendation button.
    CommissionAdvice,
    /// Commission start button.
    CommissionStart,
    /// "Back to home" shortcut button.
    NavigateBackHome,
    /// Home notification for finished missions.
    MissionComplete,
    /// Collect button in the mission list.
    CollectMission,
    /// Retire tab in the build menu.
    BuildMenuRetire,
    /// Confirm button of the ship filter dialog.
    ShipFilterConfirm,
    /// Common rarity filter toggle.
    ShipFilterRarityCommon,
    /// Rare rarity filter toggle.
    ShipFilterRarityRare,
    /// Label shown when no ship is selected for retirement.
    RetireNoneSelected,
    /// Retire confirm button.
    RetireConfirm,
    /// Disassemble button in the retire flow.
    RetireDisassemble,
    /// Any other asset, addressed by file stem.
    Named(String),
}

impl Template {
    /// Asset file stem of this template (without the `.png` extension).
    #[must_use]
    pub fn asset_name(&self) -> Cow<'static, str> {
        let name = match self {
            Self::EnemyFleet(variant) => return Cow::Owned(format!("combat_enemy_fleet_{variant}")),
            Self::MapTile(map) => return Cow::Owned(format!("map_{map}")),
            Self::Named(name) => return Cow::Owned(name.clone()),
            Self::EnemyBoss => "combat_enemy_boss",
            Self::FleetMarker => "combat_fleet_marker",
            Self::BattleStart => "combat_battle_start",
            Self::BattleConfirm => "combat_battle_confirm",
            Self::InBattle => "in_battle",
            Self::NotAutobattle => "not_autobattle",
            Self::IKnow => "i_know",
            Self::Evade => "combat_evade",
            Self::ItemsReceived => "combat_items_received",
            Self::Unable => "combat_unable",
            Self::Attack => "combat_attack",
            Self::Confirm => "confirm",
            Self::MoraleNeutral => "morale_neutral",
            Self::MoraleSad => "morale_sad",
            Self::HomeMenuBuild => "home_menu_build",
            Self::MapMenuHard => "map_menu_hard",
            Self::CommissionNotification => "notification_commission_complete",
            Self::CommissionComplete => "commission_complete",
            Self::CommissionGo => "commission_go",
            Self::CommissionInAction => "commission_in_action",
            Self::CommissionSelect => "commission_select",
            Self::CommissionAdvice => "commission_advice",
            Self::CommissionStart => "commission_start",
            Self::NavigateBackHome => "navigate_back_home",
            Self::MissionComplete => "mission_complete",
            Self::CollectMission => "collect_mission",
            Self::BuildMenuRetire => "build_menu_retire",
            Self::ShipFilterConfirm => "ship_filter_confirm",
            Self::ShipFilterRarityCommon => "ship_filter_rarity_common",
            Self::ShipFilterRarityRare => "ship_filter_rarity_rare",
            Self::RetireNoneSelected => "retire_none_selected",
            Self::RetireConfirm => "retire_confirm",
            Self::RetireDisassemble => "retire_disassemble",
        };
        Cow::Borrowed(name)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.asset_name())
    }
}

/// Template matching against the most recently captured frame.
///
/// Queries never capture on their own; callers decide when a fresh frame is
/// needed by calling [`ScreenMatcher::refresh`]. Implementations must be
/// shareable across threads because the morale gate queries the same frame
/// from two workers at once.
pub trait ScreenMatcher: Send + Sync {
    /// Capture a new frame, replacing the previous one.
    ///
    /// Implementations retry internally a bounded number of times; an error
    /// here means no decodable frame could be obtained.
    fn refresh(&mut self) -> Result<()>;

    /// Best single match of `template` scoring at least `similarity`.
    ///
    /// The returned region has the template's size.
    fn find(&self, template: &Template, similarity: f32) -> Result<Option<Region>>;

    /// Top-left corners of every match scoring at least `similarity`.
    fn find_all(&self, template: &Template, similarity: f32) -> Result<Vec<Point>>;
}

/// Synthetic touch input.
pub trait InputInjector {
    /// Tap a single point.
    fn tap(&mut self, point: Point) -> Result<()>;

    /// Tap somewhere inside `region`.
    ///
    /// The default taps the region's center; device implementations pick a
    /// random point instead.
    fn tap_region(&mut self, region: Region) -> Result<()> {
        self.tap(region.center())
    }

    /// Drag from `from` to `to` over `duration_ms` milliseconds.
    fn swipe(&mut self, from: Point, to: Point, duration_ms: u32) -> Result<()>;
}

/// Pacing delays between actions.
pub trait Pacer {
    /// Wait somewhere between `base` and `base + flex`.
    fn pause(&mut self, base: Duration, flex: Duration);
}

/// Source of the current time.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Receiver of run statistics.
pub trait StatsRecorder {
    /// Record one fully completed sortie (boss defeated).
    fn increment_combat_done(&mut self);

    /// Record one started commission.
    fn increment_commissions_started(&mut self) {}

    /// Record one mission collection pass.
    fn increment_missions_done(&mut self) {}

    /// Record one retirement pass.
    fn increment_retirements(&mut self) {}

    /// Number of completed sorties so far.
    fn combat_done(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_names() {
        assert_eq!(Template::EnemyFleet(3).asset_name(), "combat_enemy_fleet_3");
        assert_eq!(Template::MapTile("E-2".into()).asset_name(), "map_E-2");
        assert_eq!(Template::BattleStart.asset_name(), "combat_battle_start");
        assert_eq!(Template::MoraleSad.to_string(), "morale_sad");
        assert_eq!(Template::Named("custom".into()).asset_name(), "custom");
    }
}
