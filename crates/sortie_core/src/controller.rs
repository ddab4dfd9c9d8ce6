//! Device controller facade.
//!
//! The [`Controller`] bundles the injected capabilities and exposes the small
//! vocabulary every cycle is written in: capture, query, tap, swipe, pause.
//! Swipes always re-capture before returning, and taps are followed by a short
//! pause so the UI can react before the next capture.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::cancel::Cancellation;
use crate::capability::{Clock, InputInjector, Pacer, ScreenMatcher, Template};
use crate::error::Result;
use crate::geometry::{Point, Region};

/// Duration of every map swipe, in milliseconds.
pub const SWIPE_DURATION_MS: u32 = 300;

/// Pause after a tap.
const TAP_SETTLE: Duration = Duration::from_millis(400);
/// Random extra pause after a tap.
const TAP_SETTLE_FLEX: Duration = Duration::from_millis(300);
/// Pause after a swipe, before the view is captured again.
const SWIPE_SETTLE: Duration = Duration::from_millis(200);
/// Interval between polls of a bounded wait.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the device capabilities for one bot run.
pub struct Controller {
    screen: Box<dyn ScreenMatcher>,
    input: Box<dyn InputInjector>,
    pacer: Box<dyn Pacer>,
    clock: Box<dyn Clock>,
    cancel: Cancellation,
}

impl Controller {
    /// Create a controller from its capabilities.
    pub fn new(
        screen: impl ScreenMatcher + 'static,
        input: impl InputInjector + 'static,
        pacer: impl Pacer + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            screen: Box::new(screen),
            input: Box::new(input),
            pacer: Box::new(pacer),
            clock: Box::new(clock),
            cancel: Cancellation::new(),
        }
    }

    /// Replace the cancellation hook.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// The cancellation hook consulted by [`Controller::checkpoint`].
    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    /// Read-only access to the screen matcher, for concurrent queries.
    #[must_use]
    pub fn screen(&self) -> &dyn ScreenMatcher {
        self.screen.as_ref()
    }

    /// The current time.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Fail with [`crate::BotError::Cancelled`] if the run should stop.
    pub fn checkpoint(&self) -> Result<()> {
        self.cancel.check(self.clock.now())
    }

    /// Capture a fresh frame.
    pub fn refresh(&mut self) -> Result<()> {
        self.screen.refresh()
    }

    /// Best match of `template` in the current frame.
    pub fn find(&self, template: &Template, similarity: f32) -> Result<Option<Region>> {
        self.screen.find(template, similarity)
    }

    /// All matches of `template` in the current frame.
    pub fn find_all(&self, template: &Template, similarity: f32) -> Result<Vec<Point>> {
        self.screen.find_all(template, similarity)
    }

    /// Whether `template` is visible in the current frame.
    pub fn exists(&self, template: &Template, similarity: f32) -> Result<bool> {
        Ok(self.find(template, similarity)?.is_some())
    }

    /// Tap a point, then let the UI settle.
    pub fn touch(&mut self, point: Point) -> Result<()> {
        trace!(%point, "tap");
        self.input.tap(point)?;
        self.pacer.pause(TAP_SETTLE, TAP_SETTLE_FLEX);
        Ok(())
    }

    /// Tap inside a region, then let the UI settle.
    pub fn touch_region(&mut self, region: Region) -> Result<()> {
        trace!(?region, "tap region");
        self.input.tap_region(region)?;
        self.pacer.pause(TAP_SETTLE, TAP_SETTLE_FLEX);
        Ok(())
    }

    /// Tap `template` if it is visible in the current frame.
    ///
    /// Returns whether it was found.
    pub fn find_and_touch(&mut self, template: &Template, similarity: f32) -> Result<bool> {
        match self.find(template, similarity)? {
            Some(region) => {
                self.touch_region(region)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drag across the screen, let the view settle and capture the result.
    pub fn swipe(&mut self, from: Point, to: Point, duration_ms: u32) -> Result<()> {
        trace!(%from, %to, duration_ms, "swipe");
        self.input.swipe(from, to, duration_ms)?;
        self.pacer.pause(SWIPE_SETTLE, Duration::ZERO);
        self.screen.refresh()
    }

    /// Pause for between `seconds` and twice `seconds`.
    pub fn sleep(&mut self, seconds: f32) {
        let base = Duration::from_secs_f32(seconds);
        self.pacer.pause(base, base);
    }

    /// Poll for `template` for at most `budget`.
    ///
    /// This is the only bounded wait; the combat loops re-poll until the UI
    /// converges instead.
    pub fn wait_for(
        &mut self,
        template: &Template,
        budget: Duration,
        similarity: f32,
    ) -> Result<Option<Region>> {
        let limit = self.now() + budget;
        while self.now() < limit {
            self.refresh()?;
            if let Some(region) = self.find(template, similarity)? {
                return Ok(Some(region));
            }
            self.pacer.pause(POLL_INTERVAL, Duration::ZERO);
        }
        Ok(None)
    }

    /// Poll for `template` for at most `budget` and tap it once seen.
    pub fn wait_and_touch(
        &mut self,
        template: &Template,
        budget: Duration,
        similarity: f32,
    ) -> Result<bool> {
        match self.wait_for(template, budget, similarity)? {
            Some(region) => {
                self.touch_region(region)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
