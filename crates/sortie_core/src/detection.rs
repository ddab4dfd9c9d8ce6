//! Enemy contact detection and coordinate deduplication.
//!
//! Enemy contacts are drawn with four visual variants. Each variant is matched
//! separately, shifted onto a common anchor point, and the union is collapsed
//! so that every physical contact is reported once.
//!
//! - Raw matches come from a similarity ladder: 0.95 down to 0.60 in 0.05
//!   steps, stopping at the first step with any match
//! - Duplicates are merged greedily around seeds, 15px apart at least
//! - Blacklisted coordinates are dropped after clustering

use tracing::debug;

use crate::capability::Template;
use crate::controller::Controller;
use crate::error::Result;
use crate::geometry::Point;
use crate::spatial::PointIndex;

/// Distance below which two detections are the same physical target.
pub const MERGE_RADIUS: i32 = 15;

/// Ladder start, in hundredths of similarity.
const LADDER_START: u32 = 95;
/// Ladder floor, in hundredths of similarity.
const LADDER_FLOOR: u32 = 60;
/// Ladder step, in hundredths of similarity.
const LADDER_STEP: u32 = 5;

/// Contacts left of this column belong to the HUD, not the map.
const HUD_RIGHT_EDGE: i32 = 120;

/// A template variant and the offset that aligns it with the common anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantOffset {
    /// Enemy variant number (1-4).
    pub variant: u8,
    /// Horizontal shift applied to every match.
    pub dx: i32,
    /// Vertical shift applied to every match.
    pub dy: i32,
}

/// The four enemy variants and their anchor offsets.
pub const ENEMY_VARIANTS: [VariantOffset; 4] = [
    VariantOffset { variant: 1, dx: 0, dy: -10 },
    VariantOffset { variant: 2, dx: 20, dy: 20 },
    VariantOffset { variant: 3, dx: 20, dy: 20 },
    VariantOffset { variant: 4, dx: 20, dy: 20 },
];

/// Similarity thresholds tried by the fallback ladder, highest first.
pub fn similarity_ladder() -> impl Iterator<Item = f32> {
    (LADDER_FLOOR..=LADDER_START)
        .rev()
        .step_by(LADDER_STEP as usize)
        .map(|hundredths| hundredths as f32 / 100.0)
}

/// Run `probe` down the similarity ladder.
///
/// Returns the first non-empty result, or an empty list once the floor has
/// been tried.
pub fn ladder_search<F>(mut probe: F) -> Result<Vec<Point>>
where
    F: FnMut(f32) -> Result<Vec<Point>>,
{
    for similarity in similarity_ladder() {
        let found = probe(similarity)?;
        if !found.is_empty() {
            debug!(similarity, count = found.len(), "ladder hit");
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

/// Collapse near-duplicate candidates and drop blacklisted ones.
///
/// Greedy clustering: the first candidate seeds the result, and each later
/// candidate is kept only if no kept point lies closer than `radius`. Kept
/// points within `radius` of any blacklist entry, boundary included, are
/// then removed.
/// Candidate order decides which member of a cluster survives.
#[must_use]
pub fn deduplicate(candidates: &[Point], blacklist: &[Point], radius: i32) -> Vec<Point> {
    let mut seeds = PointIndex::new(radius);
    let mut kept = Vec::new();
    for &candidate in candidates {
        if !seeds.has_neighbour(candidate) {
            seeds.insert(candidate);
            kept.push(candidate);
        }
    }

    if blacklist.is_empty() {
        return kept;
    }

    // One cell wider so that points exactly `radius` away are still found.
    let banned = PointIndex::from_points(radius + 1, blacklist);
    let limit = f64::from(radius);
    kept.retain(|&p| !banned.nearest_within(p).is_some_and(|(_, d)| d <= limit));
    kept
}

/// Match every enemy variant at `similarity` and align the results.
fn raw_enemy_candidates(ctl: &Controller, similarity: f32) -> Result<Vec<Point>> {
    let mut candidates = Vec::new();
    for offset in ENEMY_VARIANTS {
        let matches = ctl.find_all(&Template::EnemyFleet(offset.variant), similarity)?;
        candidates.extend(
            matches
                .into_iter()
                .map(|p| p.offset(offset.dx, offset.dy))
                .filter(|p| p.x > HUD_RIGHT_EDGE),
        );
    }
    Ok(candidates)
}

/// Detect distinct enemy contacts in the current frame.
///
/// Never returns two contacts closer than [`MERGE_RADIUS`], nor a contact
/// at most [`MERGE_RADIUS`] from a blacklist entry.
pub fn detect_enemies(ctl: &Controller, blacklist: &[Point]) -> Result<Vec<Point>> {
    let raw = ladder_search(|similarity| raw_enemy_candidates(ctl, similarity))?;
    let contacts = deduplicate(&raw, blacklist, MERGE_RADIUS);
    debug!(raw = raw.len(), distinct = contacts.len(), "enemy detection");
    Ok(contacts)
}
