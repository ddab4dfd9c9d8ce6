//! The interface every automation cycle implements.

use crate::capability::StatsRecorder;
use crate::controller::Controller;
use crate::error::Result;

/// One unit of work polled by the outer driver.
///
/// A cycle runs to completion on every call and reports whether it did
/// anything. The driver only ever sees trait objects and never inspects the
/// concrete cycle type.
pub trait Cycle {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the cycle once.
    ///
    /// Returns `Ok(true)` when the cycle did work. Errors are hard failures
    /// (or a cancellation) and abort the driver.
    fn run_cycle(&mut self, ctl: &mut Controller, stats: &mut dyn StatsRecorder) -> Result<bool>;
}
