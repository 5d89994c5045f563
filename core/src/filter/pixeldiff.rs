use image::imageops::{self, FilterType};
use image::GrayImage;
use slide_capture_common::frame::Frame;
use tracing::debug;

use super::traits::{FrameComparator, Verdict};

pub const DEFAULT_PIXEL_DELTA: u8 = 25;
pub const DEFAULT_MAX_DIFF_FRACTION: f64 = 0.02;

/// Luminance-difference comparator.
///
/// Both frames are downsampled to half size (nearest neighbour) and
/// converted to 8-bit luminance. A pixel pair counts as changed when the
/// absolute luminance difference exceeds `delta`. Two frames are the same
/// slide when the changed fraction is strictly below `max_diff_fraction`.
///
/// Halving the resolution swallows anti-aliasing and font-hinting jitter
/// between two renders of one slide.
#[derive(Debug, Clone)]
pub struct PixelDiffComparator {
    delta: u8,
    max_diff_fraction: f64,
}

impl PixelDiffComparator {
    pub fn new(delta: u8, max_diff_fraction: f64) -> Self {
        Self {
            delta,
            max_diff_fraction,
        }
    }

    /// Fraction of changed pixel pairs, or `None` when the dimensions differ.
    pub fn diff_fraction(&self, a: &Frame, b: &Frame) -> Option<f64> {
        if a.dimensions() != b.dimensions() {
            return None;
        }
        if a.pixel_count() == 0 {
            return Some(0.0);
        }

        let luma_a = half_size_luma(a);
        let luma_b = half_size_luma(b);

        let total = luma_a.as_raw().len();
        let changed = luma_a
            .as_raw()
            .iter()
            .zip(luma_b.as_raw())
            .filter(|(pa, pb)| pa.abs_diff(**pb) > self.delta)
            .count();

        Some(changed as f64 / total as f64)
    }
}

impl Default for PixelDiffComparator {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_DELTA, DEFAULT_MAX_DIFF_FRACTION)
    }
}

fn half_size_luma(frame: &Frame) -> GrayImage {
    let width = (frame.width() / 2).max(1);
    let height = (frame.height() / 2).max(1);
    let small = imageops::resize(frame.image(), width, height, FilterType::Nearest);
    imageops::grayscale(&small)
}

impl FrameComparator for PixelDiffComparator {
    fn compare(&self, a: &Frame, b: &Frame) -> Verdict {
        let Some(fraction) = self.diff_fraction(a, b) else {
            debug!(
                a = ?a.dimensions(),
                b = ?b.dimensions(),
                "dimensions differ"
            );
            return Verdict::Different;
        };

        let verdict = if fraction < self.max_diff_fraction {
            Verdict::Same
        } else {
            Verdict::Different
        };
        debug!(
            fraction = format!("{:.4}", fraction),
            max = format!("{:.4}", self.max_diff_fraction),
            ?verdict,
            "pixel diff comparison"
        );
        verdict
    }

    fn name(&self) -> &str {
        "pixel"
    }
}
