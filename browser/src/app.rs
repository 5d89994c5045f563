use slide_capture_common::config::Config;
use slide_capture_core::output::{keys, SlideWriter};
use slide_capture_core::{CancelFlag, RunError, RunSummary};
use tracing::{info, warn};

use crate::chrome::{self, BrowserError};
use crate::present::PresentButton;
use crate::tab::{TabFrameSource, TabNavigator};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Run(#[from] RunError),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Browser(_) => "browser",
            AppError::Run(e) => e.kind(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Run(e) if e.is_cancelled())
    }
}

/// Open the deck in a browser and capture it into `config.output.folder`.
/// Blocks until the run ends; call from a blocking thread.
pub fn capture_deck(config: &Config, cancel: CancelFlag) -> Result<RunSummary, AppError> {
    info!(url = %config.deck.url, folder = %config.output.folder, "capturing deck");
    let browser = chrome::launch(&config.browser)?;
    let tab = chrome::open_deck(&browser, &config.deck.url, &config.browser)?;

    let mut entry = PresentButton::new(tab.clone(), &config.browser);
    let source = TabFrameSource::new(tab.clone(), &config.capture);
    let navigator = TabNavigator::new(tab.clone(), &config.capture);

    match slide_capture_core::run(config, &mut entry, source, navigator, cancel) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            if !e.is_cancelled() {
                let name = match &e {
                    RunError::Entry(_) => keys::PAGE_SOURCE_NAME,
                    _ => keys::ERROR_PAGE_SOURCE_NAME,
                };
                if let Some(html) = chrome::page_source(&tab) {
                    let writer = SlideWriter::new(&config.output.folder);
                    if let Err(write_err) = writer.write_page_source(name, &html) {
                        warn!(error = %write_err, "failed to save page source");
                    }
                }
            }
            Err(e.into())
        }
    }
}
