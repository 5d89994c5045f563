//! Frame comparators used to detect that the viewer did not move.

pub mod ahash;
pub mod pixeldiff;
pub mod traits;

pub use ahash::AverageHashComparator;
pub use pixeldiff::PixelDiffComparator;
pub use traits::{FrameComparator, Verdict};

use slide_capture_common::config::CompareConfig;
use tracing::warn;

/// Build the comparator selected by `[compare] method`. Unknown methods fall
/// back to the pixel comparator with a warning.
pub fn from_config(config: &CompareConfig) -> Box<dyn FrameComparator> {
    match config.method.as_str() {
        "ahash" => Box::new(AverageHashComparator::new(
            config.hash_size,
            config.hash_threshold,
        )),
        "pixel" => Box::new(PixelDiffComparator::new(
            config.pixel_delta,
            config.max_diff_fraction,
        )),
        other => {
            warn!(method = other, "unknown compare method, using pixel");
            Box::new(PixelDiffComparator::new(
                config.pixel_delta,
                config.max_diff_fraction,
            ))
        }
    }
}
