//! # Sortie Bot
//!
//! The auto-player around the combat core: configuration, run statistics,
//! the sibling cycles and the outer driver loop.
//!
//! - [`config`] - RON configuration file
//! - [`driver`] - Cooperative loop over the enabled cycles
//! - [`commission`], [`mission`], [`retirement`] - Scripted sibling cycles
//! - [`stats`] - Run statistics

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod commission;
pub mod config;
pub mod driver;
pub mod error;
pub mod mission;
pub mod retirement;
pub mod stats;

pub use config::{BotConfig, ConfigError};
pub use driver::Driver;
pub use error::AppError;
pub use stats::Stats;
