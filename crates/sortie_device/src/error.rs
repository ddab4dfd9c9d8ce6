//! Device layer errors.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use sortie_core::error::BotError;
use thiserror::Error;

/// Result type alias using [`DeviceError`].
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Failures talking to the device or loading assets.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The adb binary could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// adb ran but reported failure.
    #[error("'{command}' exited with {status}")]
    CommandFailed {
        /// The command line that failed.
        command: String,
        /// Exit status.
        status: ExitStatus,
    },

    /// A captured frame could not be decoded.
    #[error("Failed to decode frame: {0}")]
    Decode(#[source] image::ImageError),

    /// The asset directory could not be read.
    #[error("Failed to read asset directory {path}: {source}")]
    AssetDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A template image could not be loaded.
    #[error("Failed to load template {path}: {source}")]
    Template {
        /// File that failed.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// A template name was requested that the library does not hold.
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),
}

impl From<DeviceError> for BotError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::UnknownTemplate(name) => Self::MissingTemplate(name),
            other => Self::Device(other.to_string()),
        }
    }
}
