use headless_chrome::{Browser, LaunchOptions, Tab};
use slide_capture_common::config::BrowserConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::scripts;

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("failed to open tab: {0}")]
    Tab(String),
    #[error("failed to load {url}: {reason}")]
    Navigate { url: String, reason: String },
}

pub fn launch(config: &BrowserConfig) -> Result<Browser, BrowserError> {
    let browser = Browser::new(LaunchOptions {
        headless: config.headless,
        window_size: Some((config.window_width, config.window_height)),
        // The capture loop can sit on one slide for a long time.
        idle_browser_timeout: Duration::from_secs(600),
        ..Default::default()
    })
    .map_err(|e| BrowserError::Launch(e.to_string()))?;
    info!(
        headless = config.headless,
        width = config.window_width,
        height = config.window_height,
        "browser launched"
    );
    Ok(browser)
}

/// Open `url` in a fresh tab and give the viewer time to finish its own
/// loading after the navigation event.
pub fn open_deck(
    browser: &Browser,
    url: &str,
    config: &BrowserConfig,
) -> Result<Arc<Tab>, BrowserError> {
    let tab = browser
        .new_tab()
        .map_err(|e| BrowserError::Tab(e.to_string()))?;
    navigate(&tab, url)?;
    debug!(wait_secs = config.page_load_wait_secs, "waiting for viewer to load");
    std::thread::sleep(Duration::from_secs(config.page_load_wait_secs));
    info!(url, "deck opened");
    Ok(tab)
}

pub fn navigate(tab: &Tab, url: &str) -> Result<(), BrowserError> {
    tab.navigate_to(url)
        .and_then(|tab| tab.wait_until_navigated())
        .map_err(|e| BrowserError::Navigate {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(())
}

/// Evaluate `script` and return its value, or `None` on any failure.
pub fn eval(tab: &Tab, script: &str) -> Option<serde_json::Value> {
    match tab.evaluate(script, false) {
        Ok(result) => result.value,
        Err(e) => {
            debug!(error = %e, "script evaluation failed");
            None
        }
    }
}

pub fn eval_bool(tab: &Tab, script: &str) -> bool {
    eval(tab, script)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Current page HTML, if the tab still answers.
pub fn page_source(tab: &Tab) -> Option<String> {
    match tab.get_content() {
        Ok(html) => Some(html),
        Err(e) => {
            warn!(error = %e, "could not read page source");
            None
        }
    }
}

pub fn iframe_sources(tab: &Tab) -> Vec<String> {
    scripts::parse_iframe_sources(eval(tab, scripts::IFRAME_SOURCES).as_ref())
}
