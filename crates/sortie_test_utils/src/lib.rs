//! # Sortie Test Utilities
//!
//! Shared testing utilities for all crates:
//! - A reactive simulated game implementing the device capabilities
//! - Manual clock, instant pacer and recording stats
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod simulated;

pub use fixtures::{InstantPacer, ManualClock, RecordingStats};
pub use simulated::{Ambush, GameScreen, SimulatedGame};

/// Re-export proptest for convenience.
pub use proptest;
