//! # Sortie Device
//!
//! Implements the core's capability traits against a real Android device:
//!
//! - [`adb`] - Process wrapper around the `adb` tool
//! - [`matcher`] - Grayscale template matching with normalized correlation
//! - [`screen`] - Screen capture with bounded retry
//! - [`input`] - Tap and swipe injection with randomized tap positions
//! - [`pacing`] - Jittered real-time sleeps and the system clock

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod adb;
pub mod error;
pub mod input;
pub mod matcher;
pub mod pacing;
pub mod screen;

pub use adb::Adb;
pub use error::{DeviceError, Result};
pub use input::AdbInput;
pub use matcher::{FrameMatcher, TemplateLibrary};
pub use pacing::{JitterPacer, SystemClock};
pub use screen::AdbScreen;
