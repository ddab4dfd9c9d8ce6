//! Error types for the combat core.
//!
//! Only hard failures live here. A template that is not visible yet is not an
//! error, and neither is an ambiguous outcome such as a forced ambush; those
//! are handled by the polling loops and fallback branches of the state machine.

use thiserror::Error;

/// Result type alias using [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;

/// Top-level error type for everything that aborts a cycle.
#[derive(Debug, Error)]
pub enum BotError {
    /// No decodable frame could be captured from the device.
    #[error("Screen capture failed after {attempts} attempts: {message}")]
    CaptureFailed {
        /// Number of capture attempts made.
        attempts: u32,
        /// Last underlying failure.
        message: String,
    },

    /// A template was requested that is not part of the asset set.
    #[error("Missing template asset: {0}")]
    MissingTemplate(String),

    /// The input injector could not deliver a tap or swipe.
    #[error("Input injection failed: {0}")]
    InputFailed(String),

    /// The device bridge failed outside capture and input.
    #[error("Device error: {0}")]
    Device(String),

    /// A morale worker thread panicked before reporting.
    #[error("Morale worker '{0}' panicked")]
    WorkerPanicked(&'static str),

    /// Invalid configuration value handed to the core.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run was cancelled through the cancellation hook.
    #[error("Run cancelled")]
    Cancelled,
}

impl BotError {
    /// Whether this error is a requested stop rather than a failure.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
