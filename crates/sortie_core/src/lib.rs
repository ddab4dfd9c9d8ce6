//! # Sortie Core
//!
//! Combat orchestration for the sortie auto-player.
//!
//! This crate contains **only** decision logic:
//! - No process IO
//! - No system randomness
//! - No direct device access
//!
//! Screen matching, input injection, pacing and the clock are injected
//! through the traits in [`capability`], so the whole state machine can be
//! driven by a simulated game in tests.
//!
//! ## Crate Structure
//!
//! - [`capability`] - Traits for the device capabilities the core consumes
//! - [`controller`] - Facade bundling the capabilities
//! - [`detection`] - Enemy detection, similarity ladder and deduplication
//! - [`fleet`] - Fleet localization and the compass scan
//! - [`targeting`] - Nearest-target selection
//! - [`morale`] - Concurrent morale gate
//! - [`combat`] - The sortie state machine
//! - [`cycle`] - Interface shared by every automation cycle
//! - [`cancel`] - Cancellation hook for the unbounded loops

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cancel;
pub mod capability;
pub mod combat;
pub mod controller;
pub mod cycle;
pub mod detection;
pub mod error;
pub mod fleet;
pub mod geometry;
pub mod morale;
pub mod session;
pub mod spatial;
pub mod targeting;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cancel::Cancellation;
    pub use crate::capability::{
        Clock, InputInjector, Pacer, ScreenMatcher, StatsRecorder, Template, DEFAULT_SIMILARITY,
    };
    pub use crate::combat::{CombatStateMachine, Phase, PhaseOutcome};
    pub use crate::controller::Controller;
    pub use crate::cycle::Cycle;
    pub use crate::error::{BotError, Result};
    pub use crate::geometry::{Direction, Point, Region};
    pub use crate::morale::{MoraleState, MoraleVerdict};
    pub use crate::session::{CombatConfig, CombatSession, SortieMap};
}
