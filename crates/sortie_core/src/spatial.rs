//! Bucketed spatial index for radius queries over screen points.
//!
//! The index hashes points into square cells whose side equals the query
//! radius, so every point closer than the radius to a probe lies in the
//! probe's cell or one of its eight neighbours.

use std::collections::HashMap;

use crate::geometry::Point;

/// Uniform-grid index answering "nearest indexed point within radius".
#[derive(Debug, Clone)]
pub struct PointIndex {
    cell_size: i32,
    cells: HashMap<(i32, i32), Vec<Point>>,
    len: usize,
}

impl PointIndex {
    /// Create an empty index tuned for queries of the given radius.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not positive.
    #[must_use]
    pub fn new(radius: i32) -> Self {
        assert!(radius > 0, "PointIndex radius must be positive");
        Self {
            cell_size: radius,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Build an index over `points`.
    #[must_use]
    pub fn from_points(radius: i32, points: &[Point]) -> Self {
        let mut index = Self::new(radius);
        for &p in points {
            index.insert(p);
        }
        index
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a point to the index.
    pub fn insert(&mut self, point: Point) {
        self.cells.entry(self.cell_of(point)).or_default().push(point);
        self.len += 1;
    }

    /// Nearest indexed point strictly closer than the index radius.
    ///
    /// Returns the point and its distance, or `None` when every indexed point
    /// is at least one radius away.
    #[must_use]
    pub fn nearest_within(&self, probe: Point) -> Option<(Point, f64)> {
        let (cx, cy) = self.cell_of(probe);
        let limit = i64::from(self.cell_size) * i64::from(self.cell_size);

        let mut best: Option<(Point, i64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &candidate in bucket {
                    let d = candidate.distance_squared(probe);
                    if d < limit && best.map_or(true, |(_, b)| d < b) {
                        best = Some((candidate, d));
                    }
                }
            }
        }

        best.map(|(p, d)| (p, (d as f64).sqrt()))
    }

    /// Whether any indexed point is strictly closer than the radius.
    #[must_use]
    pub fn has_neighbour(&self, probe: Point) -> bool {
        self.nearest_within(probe).is_some()
    }

    fn cell_of(&self, p: Point) -> (i32, i32) {
        (p.x.div_euclid(self.cell_size), p.y.div_euclid(self.cell_size))
    }
}
