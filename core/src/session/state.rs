use slide_capture_common::frame::Frame;
use tracing::{debug, info, warn};

use crate::filter::{FrameComparator, Verdict};

use super::cancel::CancelFlag;
use super::collab::{CaptureError, FrameSource, NavigationError, Navigator};

pub const DEFAULT_MAX_STAGNATION: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Take a frame and decide whether it is a new slide.
    Capturing,
    /// Ask the viewer for the next slide.
    Advancing,
    /// The deck stopped changing for `max_stagnation` captures in a row.
    Done,
    /// A collaborator failed or the run was cancelled. Terminal.
    Aborted,
}

/// Mutable state of one capture run, owned by the loop.
#[derive(Debug, Default)]
pub struct CaptureSession {
    accepted: Vec<Frame>,
    stagnation_count: u32,
    next_index: u64,
}

impl CaptureSession {
    /// Accepted slides in capture order.
    pub fn accepted(&self) -> &[Frame] {
        &self.accepted
    }

    pub fn last_accepted(&self) -> Option<&Frame> {
        self.accepted.last()
    }

    /// Identical captures seen since the last accepted slide.
    pub fn stagnation_count(&self) -> u32 {
        self.stagnation_count
    }

    /// Index the next capture will get; also the number of captures taken.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn discarded(&self) -> u64 {
        self.next_index - self.accepted.len() as u64
    }

    fn claim_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn accept(&mut self, frame: Frame) {
        self.accepted.push(frame);
        self.stagnation_count = 0;
    }

    fn discard(&mut self) -> u32 {
        self.stagnation_count += 1;
        self.stagnation_count
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.accepted
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("capture {index} failed: {source}")]
    Capture {
        index: u64,
        #[source]
        source: CaptureError,
    },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("capture cancelled")]
    Cancelled,
    #[error("session already aborted")]
    Aborted,
    #[error("max_stagnation must be at least 1")]
    InvalidStagnation,
}

/// Drives a presentation forward one slide at a time and keeps every capture
/// that differs from the previously kept one.
///
/// Transitions:
/// - `Capturing`: the first capture is always kept. Later captures are
///   compared with the last kept frame. `Different` keeps the frame and
///   moves to `Advancing`. `Same` drops it and bumps the stagnation count,
///   moving to `Done` once the count reaches `max_stagnation` and to
///   `Advancing` otherwise.
/// - `Advancing`: send one navigation signal, back to `Capturing`.
///
/// Any collaborator error moves the loop to `Aborted`. The session is left
/// intact so the caller can inspect what was accepted before the failure.
pub struct CaptureLoop<S, N> {
    state: CaptureState,
    session: CaptureSession,
    source: S,
    navigator: N,
    comparator: Box<dyn FrameComparator>,
    max_stagnation: u32,
    cancel: CancelFlag,
    advances: u64,
}

impl<S: FrameSource, N: Navigator> CaptureLoop<S, N> {
    pub fn new(
        source: S,
        navigator: N,
        comparator: Box<dyn FrameComparator>,
        max_stagnation: u32,
    ) -> Result<Self, SessionError> {
        if max_stagnation == 0 {
            return Err(SessionError::InvalidStagnation);
        }
        Ok(Self {
            state: CaptureState::Capturing,
            session: CaptureSession::default(),
            source,
            navigator,
            comparator,
            max_stagnation,
            cancel: CancelFlag::new(),
            advances: 0,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Navigation signals sent so far.
    pub fn advance_count(&self) -> u64 {
        self.advances
    }

    /// Run until `Done`. Returns the number of accepted slides.
    pub fn run(&mut self) -> Result<usize, SessionError> {
        info!(
            comparator = self.comparator.name(),
            max_stagnation = self.max_stagnation,
            "starting slide capture"
        );
        while self.step()? != CaptureState::Done {}
        info!(
            slides = self.session.accepted.len(),
            captures = self.session.next_index,
            discarded = self.session.discarded(),
            advances = self.advances,
            "capture complete"
        );
        Ok(self.session.accepted.len())
    }

    /// Perform one transition and return the new state.
    pub fn step(&mut self) -> Result<CaptureState, SessionError> {
        let next = match self.state {
            CaptureState::Capturing => self.capture_step(),
            CaptureState::Advancing => self.advance_step(),
            CaptureState::Done => Ok(CaptureState::Done),
            CaptureState::Aborted => return Err(SessionError::Aborted),
        };
        match next {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    accepted = self.session.accepted.len(),
                    "aborting capture session"
                );
                self.state = CaptureState::Aborted;
                Err(e)
            }
        }
    }

    fn capture_step(&mut self) -> Result<CaptureState, SessionError> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let index = self.session.claim_index();
        let frame = self
            .source
            .capture(index)
            .map_err(|source| SessionError::Capture { index, source })?;

        let verdict = match self.session.last_accepted() {
            None => Verdict::Different,
            Some(last) => self.comparator.compare(last, &frame),
        };

        match verdict {
            Verdict::Different => {
                self.session.accept(frame);
                info!(
                    slide = self.session.accepted.len(),
                    index, "captured slide"
                );
                Ok(CaptureState::Advancing)
            }
            Verdict::Same => {
                let count = self.session.discard();
                if count >= self.max_stagnation {
                    info!(
                        count,
                        slides = self.session.accepted.len(),
                        "last slide confirmed"
                    );
                    return Ok(CaptureState::Done);
                }
                debug!(
                    index,
                    count,
                    max = self.max_stagnation,
                    "identical capture, retrying next slide"
                );
                Ok(CaptureState::Advancing)
            }
        }
    }

    fn advance_step(&mut self) -> Result<CaptureState, SessionError> {
        self.navigator.advance()?;
        self.advances += 1;
        Ok(CaptureState::Capturing)
    }

    pub fn into_session(self) -> CaptureSession {
        self.session
    }
}
