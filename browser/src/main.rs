mod app;
mod chrome;
mod present;
mod retry;
mod scripts;
mod tab;

use slide_capture_common::config::Config;
use slide_capture_core::CancelFlag;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 128 + SIGINT.
const INTERRUPT_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let mut config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    if config.deck.url.trim().is_empty() {
        config.deck.url = prompt("Enter the presentation URL: ", "");
        config.output.folder = prompt(
            &format!("Output folder [{}]: ", config.output.folder),
            &config.output.folder,
        );
    }
    if config.deck.url.is_empty() {
        error!("no presentation URL given");
        std::process::exit(1);
    }

    info!(
        url = %config.deck.url,
        folder = %config.output.folder,
        method = %config.compare.method,
        "opening presentation"
    );

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupt(&cancel) {
                    warn!("second interrupt, exiting now");
                    std::process::exit(INTERRUPT_EXIT_CODE);
                }
                warn!("interrupt received, stopping after the current step");
            }
        });
    }

    let job = tokio::task::spawn_blocking(move || app::capture_deck(&config, cancel));
    match job.await {
        Ok(Ok(summary)) => {
            info!(
                slides = summary.slide_count,
                document = %summary.document.display(),
                "done"
            );
        }
        Ok(Err(e)) if e.is_cancelled() => {
            info!("capture cancelled by user");
        }
        Ok(Err(e)) => {
            error!(kind = e.kind(), error = %e, "capture failed");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "capture task panicked");
            std::process::exit(1);
        }
    }
}

/// Record one Ctrl-C. The first one cancels the run cooperatively; returns
/// `true` when the run was already cancelled and the process should exit.
fn interrupt(cancel: &CancelFlag) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    cancel.cancel();
    false
}

/// Ask on stdout, read one line from stdin. Blank input or a closed stdin
/// yields `default`.
fn prompt(question: &str, default: &str) -> String {
    print!("{question}");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => answer_or_default(&line, default),
        Err(_) => default.to_string(),
    }
}

fn answer_or_default(line: &str, default: &str) -> String {
    let answer = line.trim();
    if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_interrupt_requests_exit() {
        let cancel = CancelFlag::new();
        assert!(!interrupt(&cancel));
        assert!(cancel.is_cancelled());
        assert!(interrupt(&cancel));
    }

    #[test]
    fn blank_answer_keeps_default() {
        assert_eq!(answer_or_default("\n", "slides"), "slides");
        assert_eq!(answer_or_default("   \r\n", "slides"), "slides");
    }

    #[test]
    fn answer_is_trimmed() {
        assert_eq!(
            answer_or_default("  https://example.com/deck \n", ""),
            "https://example.com/deck"
        );
    }
}
