//! Top-level error of the bot binary.

use sortie_core::error::BotError;
use sortie_device::DeviceError;
use thiserror::Error;

use crate::config::ConfigError;

/// Anything that stops the bot.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Device setup failed.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// A cycle failed.
    #[error(transparent)]
    Bot(#[from] BotError),
}

/// Result type alias using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
