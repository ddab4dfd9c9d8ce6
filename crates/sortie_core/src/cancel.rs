//! Cancellation hook for the unbounded polling loops.
//!
//! The target scan, boss search and navigate-home loops retry until the UI
//! converges and carry no timeout of their own. Every iteration passes through
//! a checkpoint that consults a [`Cancellation`], so an operator can stop a
//! run (shared flag) or give it a wall-clock budget (deadline).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{BotError, Result};

/// Shared stop flag plus optional deadline.
///
/// Clones share the same flag, so a clone handed to another thread can stop
/// the run.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A hook that never fires unless [`Cancellation::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook that also fires once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the run should stop at `now`.
    #[must_use]
    pub fn is_cancelled(&self, now: Instant) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| now >= d)
    }

    /// Return [`BotError::Cancelled`] if the run should stop at `now`.
    pub fn check(&self, now: Instant) -> Result<()> {
        if self.is_cancelled(now) {
            return Err(BotError::Cancelled);
        }
        Ok(())
    }
}
