//! Slide capture core: decides when a captured frame is a new slide, when
//! the deck has ended, and turns the accepted slides into one PDF.
//!
//! Browser control stays outside this crate. The capture loop talks to it
//! through [`session::FrameSource`], [`session::Navigator`] and
//! [`session::PresentationEntry`], which closures implement for tests.

pub mod assembler;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod session;

pub use assembler::{AssembleError, Document, DocumentAssembler};
pub use filter::{FrameComparator, Verdict};
pub use pipeline::{run, RunError, RunSummary};
pub use session::{CancelFlag, CaptureLoop, SessionError};
