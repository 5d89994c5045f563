use image::imageops::{self, FilterType};
use slide_capture_common::frame::Frame;
use tracing::debug;

use super::traits::{FrameComparator, Verdict};

/// Compute an aHash (average hash) of a frame at the given hash_size.
/// Returns a binary vector of length hash_size*hash_size.
pub fn compute_ahash(frame: &Frame, hash_size: u32) -> Vec<bool> {
    let small = imageops::resize(frame.image(), hash_size, hash_size, FilterType::Nearest);
    let gray = imageops::grayscale(&small);

    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return Vec::new();
    }
    let mean: f64 = pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64;
    pixels.iter().map(|&p| p as f64 > mean).collect()
}

/// Compute the hamming distance between two binary hashes.
pub fn hamming(a: &[bool], b: &[bool]) -> u32 {
    a.iter().zip(b.iter()).filter(|(a, b)| a != b).count() as u32
}

/// Average-hash comparator.
///
/// Cheaper and more forgiving than [`super::PixelDiffComparator`]: frames are
/// reduced to a `hash_size x hash_size` luminance thumbnail, each cell
/// becomes one bit (above or below the mean), and two frames are the same
/// slide when at most `threshold` bits differ. Suited to viewers that stream
/// slides as lossy video.
#[derive(Debug, Clone)]
pub struct AverageHashComparator {
    hash_size: u32,
    threshold: u32,
}

impl AverageHashComparator {
    pub fn new(hash_size: u32, threshold: u32) -> Self {
        Self {
            hash_size,
            threshold,
        }
    }
}

impl FrameComparator for AverageHashComparator {
    fn compare(&self, a: &Frame, b: &Frame) -> Verdict {
        if a.dimensions() != b.dimensions() {
            return Verdict::Different;
        }
        if a.pixel_count() == 0 {
            return Verdict::Same;
        }

        let distance = hamming(
            &compute_ahash(a, self.hash_size),
            &compute_ahash(b, self.hash_size),
        );
        let verdict = if distance <= self.threshold {
            Verdict::Same
        } else {
            Verdict::Different
        };
        debug!(
            distance,
            threshold = self.threshold,
            ?verdict,
            "aHash comparison"
        );
        verdict
    }

    fn name(&self) -> &str {
        "ahash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient(index: u64, flip: bool) -> Frame {
        let img = RgbaImage::from_fn(64, 64, |x, _| {
            let v = (x * 4) as u8;
            let v = if flip { 255 - v } else { v };
            Rgba([v, v, v, 255])
        });
        Frame::new(index, 0, img)
    }

    #[test]
    fn hash_has_expected_length() {
        assert_eq!(compute_ahash(&gradient(0, false), 8).len(), 64);
        assert_eq!(compute_ahash(&gradient(0, false), 16).len(), 256);
    }

    #[test]
    fn hamming_counts_mismatches() {
        assert_eq!(hamming(&[true, false, true], &[true, false, true]), 0);
        assert_eq!(hamming(&[true, false, true], &[false, false, false]), 2);
    }

    #[test]
    fn identical_frames_are_same() {
        let cmp = AverageHashComparator::new(16, 4);
        let a = gradient(0, false);
        let b = gradient(1, false);
        assert_eq!(cmp.compare(&a, &a), Verdict::Same);
        assert_eq!(cmp.compare(&a, &b), Verdict::Same);
    }

    #[test]
    fn mirrored_gradient_is_different() {
        let cmp = AverageHashComparator::new(16, 4);
        let a = gradient(0, false);
        let b = gradient(1, true);
        assert_eq!(cmp.compare(&a, &b), Verdict::Different);
        assert_eq!(cmp.compare(&b, &a), Verdict::Different);
    }

    #[test]
    fn differing_dimensions_are_different() {
        let cmp = AverageHashComparator::new(8, 64);
        let a = gradient(0, false);
        let b = Frame::new(1, 0, RgbaImage::new(32, 64));
        assert_eq!(cmp.compare(&a, &b), Verdict::Different);
    }
}
