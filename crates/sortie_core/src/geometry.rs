//! Screen-space geometry helpers.
//!
//! All coordinates are device pixels on a 1280x720 landscape screen with the
//! origin at the top-left corner.

use serde::{Deserialize, Serialize};

/// Device screen width in pixels.
pub const SCREEN_WIDTH: i32 = 1280;

/// Device screen height in pixels.
pub const SCREEN_HEIGHT: i32 = 720;

/// Anchor point for every map swipe.
pub const SCREEN_CENTER: Point = Point::new(SCREEN_WIDTH / 2, SCREEN_HEIGHT / 2);

/// A pixel coordinate on the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal pixel coordinate.
    pub x: i32,
    /// Vertical pixel coordinate.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared Euclidean distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// An axis-aligned rectangle, anchored at its top-left corner.
///
/// Used both for fixed UI tap areas and for single template matches, where
/// the size is the template's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl Region {
    /// Create a new region.
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// The whole device screen.
    pub const FULL_SCREEN: Self = Self::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT);

    /// Top-left corner.
    #[must_use]
    pub const fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Center point (rounded towards the origin).
    #[must_use]
    pub const fn center(self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Whether `point` lies inside the region (edges inclusive).
    #[must_use]
    pub const fn contains(self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.w
            && point.y >= self.y
            && point.y <= self.y + self.h
    }
}

/// Find the point in `points` nearest to `origin`.
///
/// Returns the index of the nearest point and its distance, or `None` for an
/// empty slice. Ties go to the earliest point.
#[must_use]
pub fn nearest(points: &[Point], origin: Point) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.distance_squared(origin))
        .map(|(i, p)| (i, p.distance(origin)))
}

/// Compass direction used by the map scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Reveal what lies above the current view.
    North,
    /// Reveal what lies right of the current view.
    East,
    /// Reveal what lies below the current view.
    South,
    /// Reveal what lies left of the current view.
    West,
}

impl Direction {
    /// The fixed scan order.
    pub const COMPASS: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Whether this direction moves the view along the vertical axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    /// The drag gesture that scrolls the view by `distance` in this direction.
    ///
    /// Returns `(from, to)` around the screen center.
    #[must_use]
    pub fn swipe(self, distance: i32) -> (Point, Point) {
        let c = SCREEN_CENTER;
        match self {
            Self::North => (c.offset(0, -distance), c.offset(0, distance)),
            Self::South => (c.offset(0, distance), c.offset(0, -distance)),
            Self::East => (c.offset(distance, 0), c.offset(-distance, 0)),
            Self::West => (c.offset(-distance, 0), c.offset(distance, 0)),
        }
    }

    /// Where a map feature seen at `point` ends up after swiping by `distance`.
    ///
    /// The content follows the drag, which spans twice the swipe distance.
    #[must_use]
    pub const fn shift(self, point: Point, distance: i32) -> Point {
        match self {
            Self::North => point.offset(0, 2 * distance),
            Self::South => point.offset(0, -2 * distance),
            // Horizontal signs follow the drag: scanning East pulls content left.
            Self::East => point.offset(-2 * distance, 0),
            Self::West => point.offset(2 * distance, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(100, 100);
        let b = Point::new(103, 104);
        assert_eq!(a.distance_squared(b), 25);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let points = [Point::new(10, 0), Point::new(0, 10), Point::new(50, 50)];
        let (idx, dist) = nearest(&points, Point::new(0, 0)).unwrap();
        assert_eq!(idx, 0);
        assert!((dist - 10.0).abs() < f64::EPSILON);
        assert!(nearest(&[], Point::new(0, 0)).is_none());
    }

    #[test]
    fn test_region_center_and_contains() {
        let region = Region::new(12, 8, 45, 30);
        assert_eq!(region.center(), Point::new(34, 23));
        assert!(region.contains(Point::new(12, 8)));
        assert!(region.contains(Point::new(57, 38)));
        assert!(!region.contains(Point::new(58, 38)));
    }

    #[test]
    fn test_direction_swipes_mirror() {
        let (from, to) = Direction::North.swipe(175);
        assert_eq!(from, Point::new(640, 185));
        assert_eq!(to, Point::new(640, 535));

        let (from, to) = Direction::East.swipe(125);
        assert_eq!(from, Point::new(765, 360));
        assert_eq!(to, Point::new(515, 360));

        assert_eq!(Direction::South.swipe(10), (Point::new(640, 370), Point::new(640, 350)));
        assert_eq!(Direction::West.swipe(10), (Point::new(630, 360), Point::new(650, 360)));
    }

    #[test]
    fn test_direction_shift() {
        let p = Point::new(500, 300);
        assert_eq!(Direction::North.shift(p, 100), Point::new(500, 500));
        assert_eq!(Direction::South.shift(p, 100), Point::new(500, 100));
        assert_eq!(Direction::East.shift(p, 100), Point::new(300, 300));
        assert_eq!(Direction::West.shift(p, 100), Point::new(700, 300));
    }
}
