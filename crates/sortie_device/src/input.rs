//! Touch input over `adb shell input`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sortie_core::capability::InputInjector;
use sortie_core::error::{BotError, Result};
use sortie_core::geometry::{Point, Region};
use tracing::debug;

use crate::adb::Adb;

/// Injects taps and swipes on a device.
#[derive(Debug)]
pub struct AdbInput {
    adb: Adb,
    rng: StdRng,
}

impl AdbInput {
    /// Input with an entropy-seeded jitter source.
    #[must_use]
    pub fn new(adb: Adb) -> Self {
        Self {
            adb,
            rng: StdRng::from_entropy(),
        }
    }

    /// Input with a fixed seed, for reproducible tap positions.
    #[must_use]
    pub fn with_seed(adb: Adb, seed: u64) -> Self {
        Self {
            adb,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn shell(&self, args: &[&str]) -> Result<()> {
        self.adb
            .shell(args)
            .map_err(|e| BotError::InputFailed(e.to_string()))
    }
}

/// A uniformly random point inside `region`, edges inclusive.
pub fn random_point_in<R: Rng>(rng: &mut R, region: Region) -> Point {
    Point::new(
        rng.gen_range(region.x..=region.x + region.w.max(0)),
        rng.gen_range(region.y..=region.y + region.h.max(0)),
    )
}

impl InputInjector for AdbInput {
    fn tap(&mut self, point: Point) -> Result<()> {
        debug!(%point, "tap");
        self.shell(&["input", "tap", &point.x.to_string(), &point.y.to_string()])
    }

    fn tap_region(&mut self, region: Region) -> Result<()> {
        let point = random_point_in(&mut self.rng, region);
        self.tap(point)
    }

    fn swipe(&mut self, from: Point, to: Point, duration_ms: u32) -> Result<()> {
        debug!(%from, %to, duration_ms, "swipe");
        self.shell(&[
            "input",
            "swipe",
            &from.x.to_string(),
            &from.y.to_string(),
            &to.x.to_string(),
            &to.y.to_string(),
            &duration_ms.to_string(),
        ])
    }
}
