//! Real-time pacing and wall clock.

use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sortie_core::capability::{Clock, Pacer};

/// Sleeps for a random duration in `[base, base + flex]`.
#[derive(Debug)]
pub struct JitterPacer {
    rng: StdRng,
}

impl JitterPacer {
    /// Pacer with an entropy-seeded jitter source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Pacer with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a delay in `[base, base + flex]`.
    pub fn delay(&mut self, base: Duration, flex: Duration) -> Duration {
        if flex.is_zero() {
            return base;
        }
        base + self.rng.gen_range(Duration::ZERO..=flex)
    }
}

impl Default for JitterPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for JitterPacer {
    fn pause(&mut self, base: Duration, flex: Duration) {
        thread::sleep(self.delay(base, flex));
    }
}

/// The system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
