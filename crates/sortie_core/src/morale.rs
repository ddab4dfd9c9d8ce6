//! Morale gate run before every battle.
//!
//! Both morale icons are checked against the same frame on two scoped worker
//! threads. Each worker reports only its own flag, and both are joined before
//! the verdict is read.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::capability::{ScreenMatcher, Template, DEFAULT_SIMILARITY};
use crate::controller::Controller;
use crate::error::{BotError, Result};
use crate::session::CombatSession;

/// Deferral when the fleet is sad.
pub const SAD_DEFERRAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Deferral when the fleet is neutral.
pub const NEUTRAL_DEFERRAL: Duration = Duration::from_secs(60 * 60);

/// Morale flags read from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoraleState {
    /// The neutral morale icon is visible.
    pub neutral: bool,
    /// The sad morale icon is visible.
    pub sad: bool,
}

/// Outcome of a morale check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoraleVerdict {
    /// Morale is fine; the battle may start.
    Proceed,
    /// Morale is low; retry the sortie after the given delay.
    Defer(Duration),
}

impl MoraleState {
    /// Apply the precedence: sad, then neutral, then proceed.
    #[must_use]
    pub const fn verdict(self) -> MoraleVerdict {
        if self.sad {
            MoraleVerdict::Defer(SAD_DEFERRAL)
        } else if self.neutral {
            MoraleVerdict::Defer(NEUTRAL_DEFERRAL)
        } else {
            MoraleVerdict::Proceed
        }
    }
}

/// Check both morale icons concurrently against the current frame.
pub fn check_morale(screen: &dyn ScreenMatcher) -> Result<MoraleState> {
    let probe = |template: Template| screen.find(&template, DEFAULT_SIMILARITY).map(|m| m.is_some());

    let (neutral, sad) = thread::scope(|s| {
        let neutral = s.spawn(|| probe(Template::MoraleNeutral));
        let sad = s.spawn(|| probe(Template::MoraleSad));
        (
            neutral.join().map_err(|_| BotError::WorkerPanicked("neutral")),
            sad.join().map_err(|_| BotError::WorkerPanicked("sad")),
        )
    });

    Ok(MoraleState {
        neutral: neutral??,
        sad: sad??,
    })
}

/// Capture a frame, check morale and defer the session if needed.
///
/// The deferral is measured from the time of the call.
pub fn morale_gate(ctl: &mut Controller, session: &mut CombatSession) -> Result<MoraleVerdict> {
    let now = ctl.now();
    ctl.refresh()?;
    let state = check_morale(ctl.screen())?;
    let verdict = state.verdict();
    match verdict {
        MoraleVerdict::Proceed => info!("Morale check passed."),
        MoraleVerdict::Defer(delay) => {
            warn!(
                neutral = state.neutral,
                sad = state.sad,
                hours = delay.as_secs() / 3600,
                "Low morale, deferring sortie."
            );
            session.defer(now, delay);
        }
    }
    Ok(verdict)
}
