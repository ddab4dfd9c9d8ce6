//! Screen capture over adb.

use image::{GrayImage, ImageFormat};
use sortie_core::capability::{ScreenMatcher, Template};
use sortie_core::error::{BotError, Result as BotResult};
use sortie_core::geometry::{Point, Region};
use tracing::{debug, warn};

use crate::adb::Adb;
use crate::error::{DeviceError, Result};
use crate::matcher::{FrameMatcher, TemplateLibrary};

/// Capture attempts before a refresh gives up.
pub const CAPTURE_ATTEMPTS: u32 = 5;

/// Decode a PNG screenshot into a grayscale frame.
pub fn decode_frame(bytes: &[u8]) -> Result<GrayImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|img| img.to_luma8())
        .map_err(DeviceError::Decode)
}

/// Live device screen backed by `adb exec-out screencap`.
#[derive(Debug)]
pub struct AdbScreen {
    adb: Adb,
    matcher: FrameMatcher,
}

impl AdbScreen {
    /// Bind a template library to a device.
    #[must_use]
    pub fn new(adb: Adb, library: TemplateLibrary) -> Self {
        Self {
            adb,
            matcher: FrameMatcher::new(library),
        }
    }

    /// The matcher holding the current frame.
    #[must_use]
    pub fn matcher(&self) -> &FrameMatcher {
        &self.matcher
    }

    fn capture(&self) -> Result<GrayImage> {
        let bytes = self.adb.exec_out(&["screencap", "-p"])?;
        decode_frame(&bytes)
    }
}

impl ScreenMatcher for AdbScreen {
    fn refresh(&mut self) -> BotResult<()> {
        let mut last = String::new();
        for attempt in 1..=CAPTURE_ATTEMPTS {
            match self.capture() {
                Ok(frame) => {
                    debug!(width = frame.width(), height = frame.height(), "frame captured");
                    self.matcher.set_frame(frame);
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Screen capture failed, retrying.");
                    last = e.to_string();
                }
            }
        }
        Err(BotError::CaptureFailed {
            attempts: CAPTURE_ATTEMPTS,
            message: last,
        })
    }

    fn find(&self, template: &Template, similarity: f32) -> BotResult<Option<Region>> {
        Ok(self.matcher.find(&template.asset_name(), similarity)?)
    }

    fn find_all(&self, template: &Template, similarity: f32) -> BotResult<Vec<Point>> {
        Ok(self.matcher.find_all(&template.asset_name(), similarity)?)
    }
}
