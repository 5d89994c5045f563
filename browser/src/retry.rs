use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with doubling backoff for browser calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        (self.initial_backoff * factor).min(self.max_backoff)
    }

    /// Run `op` until it succeeds or the attempts are used up. `op` gets the
    /// 1-based attempt number. The last error is returned.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        what,
                        attempt,
                        attempts = self.attempts,
                        error = %e,
                        "attempt failed, retrying in {:?}", delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
