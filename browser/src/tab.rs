//! Frame source and navigator backed by a live browser tab.

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::Tab;
use slide_capture_common::config::CaptureConfig;
use slide_capture_common::frame::Frame;
use slide_capture_core::session::{CaptureError, FrameSource, NavigationError, Navigator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::chrome;
use crate::retry::RetryPolicy;
use crate::scripts;

const READY_POLL: Duration = Duration::from_millis(100);

/// Waits for the slide to stop changing, then screenshots the viewport.
pub struct TabFrameSource {
    tab: Arc<Tab>,
    ready_timeout: Duration,
    settle: Duration,
    recheck: Duration,
    extra_settle: Duration,
    retry: RetryPolicy,
}

impl TabFrameSource {
    pub fn new(tab: Arc<Tab>, config: &CaptureConfig) -> Self {
        Self {
            tab,
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
            settle: Duration::from_millis(config.settle_ms),
            recheck: Duration::from_millis(config.recheck_ms),
            extra_settle: Duration::from_millis(config.extra_settle_ms),
            retry: RetryPolicy::new(config.retry_attempts),
        }
    }

    fn wait_until_ready(&self) {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            let state = chrome::eval(&self.tab, scripts::READY_STATE);
            if state.as_ref().and_then(|v| v.as_str()) == Some("complete") {
                return;
            }
            if Instant::now() >= deadline {
                warn!("document not ready before timeout, capturing anyway");
                return;
            }
            std::thread::sleep(READY_POLL);
        }
    }

    /// Give animations time to finish. If the DOM still moves across a
    /// short recheck window, wait once more.
    fn settle(&self) {
        std::thread::sleep(self.settle);
        let before = chrome::page_source(&self.tab);
        std::thread::sleep(self.recheck);
        let after = chrome::page_source(&self.tab);
        if before != after {
            debug!("page still changing, waiting longer");
            std::thread::sleep(self.extra_settle);
        }
    }

    fn capture_once(&self, index: u64) -> Result<Frame, String> {
        self.wait_until_ready();
        self.settle();
        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| e.to_string())?;
        let captured_at = chrono::Utc::now().timestamp_millis();
        Frame::decode(index, captured_at, &png).map_err(|e| e.to_string())
    }
}

impl FrameSource for TabFrameSource {
    fn capture(&mut self, index: u64) -> Result<Frame, CaptureError> {
        let frame = self
            .retry
            .run("capture", |_| self.capture_once(index))
            .map_err(CaptureError)?;
        info!(
            index,
            width = frame.width(),
            height = frame.height(),
            "frame captured"
        );
        Ok(frame)
    }
}

/// Advances the deck with a right-arrow key press.
pub struct TabNavigator {
    tab: Arc<Tab>,
    advance_wait: Duration,
    retry: RetryPolicy,
}

impl TabNavigator {
    pub fn new(tab: Arc<Tab>, config: &CaptureConfig) -> Self {
        Self {
            tab,
            advance_wait: Duration::from_millis(config.advance_wait_ms),
            retry: RetryPolicy::new(config.retry_attempts),
        }
    }

    fn press_arrow_right(&self) -> Result<(), String> {
        match self.tab.press_key("ArrowRight") {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "key event failed, dispatching from script");
                self.tab
                    .evaluate(scripts::ARROW_RIGHT_FALLBACK, false)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        }
    }
}

impl Navigator for TabNavigator {
    fn advance(&mut self) -> Result<(), NavigationError> {
        self.retry
            .run("advance", |_| self.press_arrow_right())
            .map_err(NavigationError)?;
        std::thread::sleep(self.advance_wait);
        debug!("advanced to next slide");
        Ok(())
    }
}
