//! Interfaces to whatever hosts the presentation (a browser tab in the
//! shipped binary, closures in tests).

use slide_capture_common::frame::Frame;

/// Produces the currently rendered slide.
///
/// Implementations own any "wait until the render is stable" logic and any
/// bounded retrying; an `Err` means retries are exhausted.
pub trait FrameSource {
    fn capture(&mut self, index: u64) -> Result<Frame, CaptureError>;
}

/// Sends one "next slide" signal to the presentation surface.
pub trait Navigator {
    fn advance(&mut self) -> Result<(), NavigationError>;
}

/// Switches the hosting surface into full-screen presentation rendering.
/// Returns `false` when presentation mode could not be reached.
pub trait PresentationEntry {
    fn enter_presentation_mode(&mut self) -> bool;
}

impl<F> FrameSource for F
where
    F: FnMut(u64) -> Result<Frame, CaptureError>,
{
    fn capture(&mut self, index: u64) -> Result<Frame, CaptureError> {
        self(index)
    }
}

impl<F> Navigator for F
where
    F: FnMut() -> Result<(), NavigationError>,
{
    fn advance(&mut self) -> Result<(), NavigationError> {
        self()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("frame capture failed: {0}")]
pub struct CaptureError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("navigation signal failed: {0}")]
pub struct NavigationError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("could not enter presentation mode")]
pub struct EntryError;
