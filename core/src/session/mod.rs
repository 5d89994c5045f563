pub mod cancel;
pub mod collab;
pub mod state;

pub use cancel::CancelFlag;
pub use collab::{
    CaptureError, EntryError, FrameSource, NavigationError, Navigator, PresentationEntry,
};
pub use state::{CaptureLoop, CaptureSession, CaptureState, SessionError, DEFAULT_MAX_STAGNATION};
