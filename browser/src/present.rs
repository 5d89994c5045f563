use headless_chrome::Tab;
use slide_capture_common::config::BrowserConfig;
use slide_capture_core::session::PresentationEntry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chrome;
use crate::scripts;

/// Enters presentation mode by clicking the viewer's present control.
pub struct PresentButton {
    tab: Arc<Tab>,
    selector: String,
    attempts: u32,
    retry_delay: Duration,
    post_entry_wait: Duration,
}

impl PresentButton {
    pub fn new(tab: Arc<Tab>, config: &BrowserConfig) -> Self {
        Self {
            tab,
            selector: config.present_selector.clone(),
            attempts: config.click_attempts.max(1),
            retry_delay: Duration::from_secs(1),
            post_entry_wait: Duration::from_secs(config.post_entry_wait_secs),
        }
    }

    fn click(&self) -> bool {
        let script = scripts::click_present(&self.selector);
        for attempt in 1..=self.attempts {
            if chrome::eval_bool(&self.tab, &script) {
                debug!(attempt, "present control clicked");
                return true;
            }
            debug!(attempt, attempts = self.attempts, "present control not found");
            if attempt < self.attempts {
                std::thread::sleep(self.retry_delay);
            }
        }
        false
    }

    /// Cross-origin viewers hide the control inside an iframe we cannot
    /// script from the outer page. Load each iframe directly and retry.
    fn click_via_iframes(&self) -> bool {
        for src in chrome::iframe_sources(&self.tab) {
            info!(src = %src, "opening embedded viewer");
            if let Err(e) = chrome::navigate(&self.tab, &src) {
                warn!(error = %e, "could not open embedded viewer");
                continue;
            }
            std::thread::sleep(self.post_entry_wait);
            if self.click() {
                return true;
            }
        }
        false
    }
}

impl PresentationEntry for PresentButton {
    fn enter_presentation_mode(&mut self) -> bool {
        if !self.click() && !self.click_via_iframes() {
            warn!(selector = %self.selector, "present control not found");
            return false;
        }
        std::thread::sleep(self.post_entry_wait);
        if chrome::eval_bool(&self.tab, scripts::IS_PRESENTING) {
            info!("presentation mode confirmed");
        } else {
            // Some viewers present without fullscreen or a URL change.
            warn!("presentation mode not confirmed, continuing");
        }
        true
    }
}
