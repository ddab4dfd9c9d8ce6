//! Fixed UI tap areas on the 1280x720 layout.

use crate::geometry::Region;

/// Back arrow in the top-left corner.
pub const NAV_BACK: Region = Region::new(12, 8, 45, 30);
/// "Attack" entry of the home menu.
pub const HOME_MENU_ATTACK: Region = Region::new(1000, 365, 180, 60);
/// Event sub-tab on the chapter screen.
pub const EVENT_MAP_TAB: Region = Region::new(1145, 140, 70, 40);
/// First "go" button (map details).
pub const MAP_GO_1: Region = Region::new(875, 465, 115, 35);
/// Second "go" button (fleet selection).
pub const MAP_GO_2: Region = Region::new(980, 600, 180, 55);
/// Auto-battle toggle on the battle screen.
pub const AUTOBATTLE_TOGGLE: Region = Region::new(40, 30, 190, 40);
/// Fleet switch button on the map.
pub const SWITCH_FLEET: Region = Region::new(850, 650, 180, 40);
/// Dismiss area of the "submarine unavailable" warning.
pub const UNABLE_SUBMARINE: Region = Region::new(1100, 500, 50, 30);
/// Safe area to tap through battle result screens.
pub const RESULT_SKIP: Region = Region::new(0, 0, 300, 300);
