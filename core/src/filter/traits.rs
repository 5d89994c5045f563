use slide_capture_common::frame::Frame;

/// Outcome of comparing two captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Same,
    Different,
}

/// Decides whether two captures show the same slide.
///
/// Implementations must be pure: the verdict depends only on the two frames,
/// and frames of differing dimensions are always `Different`.
pub trait FrameComparator: Send + Sync {
    fn compare(&self, a: &Frame, b: &Frame) -> Verdict;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
