use slide_capture_common::config::Config;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::assembler::{AssembleError, DocumentAssembler};
use crate::filter;
use crate::output::{Manifest, OutputError, SlideWriter};
use crate::session::{
    CancelFlag, CaptureLoop, EntryError, FrameSource, Navigator, PresentationEntry, SessionError,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl RunError {
    /// Short failure kind for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::Entry(_) => "entry",
            RunError::Session(SessionError::Capture { .. }) => "capture",
            RunError::Session(SessionError::Navigation(_)) => "navigation",
            RunError::Session(SessionError::Cancelled) => "cancelled",
            RunError::Session(_) => "session",
            RunError::Assemble(AssembleError::EmptyInput) => "empty-input",
            RunError::Assemble(_) => "assemble",
            RunError::Output(_) => "output",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Session(SessionError::Cancelled))
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub document: PathBuf,
    pub slide_count: usize,
    /// Intermediate slide images, when `output.save_frames` is set.
    pub slide_images: Vec<String>,
    pub manifest: Option<PathBuf>,
}

/// One complete capture: enter presentation mode, page through the deck,
/// then write the document and its side artifacts.
///
/// Nothing is assembled unless the capture loop finishes. When a
/// collaborator fails mid-run, the slides accepted so far are dumped to a
/// `partial_*` folder (if enabled) and the error is returned.
pub fn run<E, S, N>(
    config: &Config,
    entry: &mut E,
    source: S,
    navigator: N,
    cancel: CancelFlag,
) -> Result<RunSummary, RunError>
where
    E: PresentationEntry + ?Sized,
    S: FrameSource,
    N: Navigator,
{
    let writer = SlideWriter::new(&config.output.folder);
    writer.ensure_folder()?;

    if !entry.enter_presentation_mode() {
        error!("could not enter presentation mode");
        return Err(EntryError.into());
    }
    info!("presentation mode entered");

    let mut capture = CaptureLoop::new(
        source,
        navigator,
        filter::from_config(&config.compare),
        config.capture.max_stagnation,
    )?
    .with_cancel(cancel);

    if let Err(e) = capture.run() {
        let accepted = capture.session().accepted();
        let dump = config.output.dump_partial
            && !accepted.is_empty()
            && !matches!(e, SessionError::Cancelled);
        if dump {
            let now = chrono::Utc::now().timestamp_millis();
            if let Err(dump_err) = writer.dump_partial(accepted, now) {
                warn!(error = %dump_err, "failed to dump partial frames");
            }
        }
        return Err(e.into());
    }

    let frames = capture.into_session().into_frames();
    let doc = DocumentAssembler::new(config.output.resolution_dpi, config.output.jpeg_quality)
        .assemble(&frames)?;

    let slide_images = if config.output.save_frames {
        writer.write_slides(&frames)?
    } else {
        Vec::new()
    };
    let manifest = if config.output.write_manifest {
        let manifest = Manifest::new(
            &config.deck.url,
            &config.output.document_name,
            &frames,
            config.output.save_frames.then_some(slide_images.as_slice()),
            chrono::Utc::now().timestamp_millis(),
        );
        Some(writer.write_manifest(&manifest)?)
    } else {
        None
    };

    // Written last so a failed run never leaves a document behind.
    let document = writer.write_document(&doc, &config.output.document_name)?;

    info!(
        slides = frames.len(),
        document = %document.display(),
        "presentation saved"
    );

    Ok(RunSummary {
        document,
        slide_count: frames.len(),
        slide_images,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CaptureError, NavigationError};
    use image::{Rgba, RgbaImage};
    use slide_capture_common::frame::Frame;
    use std::cell::Cell;
    use std::rc::Rc;

    struct StubEntry {
        succeeds: bool,
        calls: u32,
    }

    impl PresentationEntry for StubEntry {
        fn enter_presentation_mode(&mut self) -> bool {
            self.calls += 1;
            self.succeeds
        }
    }

    fn slide(number: u32) -> RgbaImage {
        RgbaImage::from_fn(32, 24, |x, _| {
            if x / 4 == number {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.deck.url = "https://example.com/deck".into();
        config.output.folder = dir.join("slides").display().to_string();
        config.capture.max_stagnation = 3;
        config
    }

    /// Source and navigator over a deck that sticks on its last slide.
    fn deck(
        slides: usize,
        fail_at: Option<u64>,
    ) -> (
        impl FnMut(u64) -> Result<Frame, CaptureError>,
        impl FnMut() -> Result<(), NavigationError>,
    ) {
        let position = Rc::new(Cell::new(0usize));
        let source = {
            let position = position.clone();
            move |index: u64| -> Result<Frame, CaptureError> {
                if Some(index) == fail_at {
                    return Err(CaptureError("render never settled".into()));
                }
                let slide_no = position.get().min(slides - 1) as u32;
                Ok(Frame::new(index, 1739871000000, slide(slide_no)))
            }
        };
        let navigator = move || -> Result<(), NavigationError> {
            position.set(position.get() + 1);
            Ok(())
        };
        (source, navigator)
    }

    #[test]
    fn full_run_writes_document_slides_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (source, navigator) = deck(4, None);
        let mut entry = StubEntry {
            succeeds: true,
            calls: 0,
        };

        let summary = run(&config, &mut entry, source, navigator, CancelFlag::new()).unwrap();
        assert_eq!(entry.calls, 1);
        assert_eq!(summary.slide_count, 4);
        assert_eq!(summary.slide_images.len(), 4);

        let pdf = lopdf::Document::load(&summary.document).unwrap();
        assert_eq!(pdf.get_pages().len(), 4);

        let folder = dir.path().join("slides");
        assert!(folder.join("slide_003.png").exists());
        assert!(!folder.join("slide_004.png").exists());
        assert_eq!(summary.manifest, Some(folder.join("manifest.json")));
    }

    #[test]
    fn entry_failure_aborts_before_capture() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let captures = Rc::new(Cell::new(0u32));
        let source = {
            let captures = captures.clone();
            move |index: u64| -> Result<Frame, CaptureError> {
                captures.set(captures.get() + 1);
                Ok(Frame::new(index, 0, slide(0)))
            }
        };
        let navigator = || -> Result<(), NavigationError> { Ok(()) };
        let mut entry = StubEntry {
            succeeds: false,
            calls: 0,
        };

        let err = run(&config, &mut entry, source, navigator, CancelFlag::new()).unwrap_err();
        assert!(matches!(err, RunError::Entry(_)));
        assert_eq!(err.kind(), "entry");
        assert_eq!(captures.get(), 0);
        assert!(!dir.path().join("slides/presentation.pdf").exists());
    }

    #[test]
    fn capture_failure_leaves_partial_dump_and_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (source, navigator) = deck(4, Some(1));
        let mut entry = StubEntry {
            succeeds: true,
            calls: 0,
        };

        let err = run(&config, &mut entry, source, navigator, CancelFlag::new()).unwrap_err();
        assert_eq!(err.kind(), "capture");

        let folder = dir.path().join("slides");
        assert!(!folder.join("presentation.pdf").exists());
        assert!(!folder.join("manifest.json").exists());
        let partial: Vec<_> = std::fs::read_dir(&folder)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("partial_"))
            .collect();
        assert_eq!(partial.len(), 1);
        assert!(partial[0].path().join("slide_000.png").exists());
        assert!(!partial[0].path().join("slide_001.png").exists());
    }

    #[test]
    fn cancelled_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (source, navigator) = deck(4, None);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut entry = StubEntry {
            succeeds: true,
            calls: 0,
        };

        let err = run(&config, &mut entry, source, navigator, cancel).unwrap_err();
        assert!(err.is_cancelled());
        let entries = std::fs::read_dir(dir.path().join("slides")).unwrap().count();
        assert_eq!(entries, 0);
    }

    #[test]
    fn manifest_failure_leaves_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let folder = dir.path().join("slides");
        // A directory in the manifest's place makes the write fail.
        std::fs::create_dir_all(folder.join("manifest.json")).unwrap();
        let (source, navigator) = deck(3, None);
        let mut entry = StubEntry {
            succeeds: true,
            calls: 0,
        };

        let err = run(&config, &mut entry, source, navigator, CancelFlag::new()).unwrap_err();
        assert_eq!(err.kind(), "output");
        assert!(!folder.join("presentation.pdf").exists());
    }

    #[test]
    fn frames_and_manifest_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.output.save_frames = false;
        config.output.write_manifest = false;
        config.output.document_name = "deck.pdf".into();
        let (source, navigator) = deck(2, None);
        let mut entry = StubEntry {
            succeeds: true,
            calls: 0,
        };

        let summary = run(&config, &mut entry, source, navigator, CancelFlag::new()).unwrap();
        assert_eq!(summary.slide_count, 2);
        assert!(summary.slide_images.is_empty());
        assert!(summary.manifest.is_none());
        assert!(summary.document.ends_with("deck.pdf"));
        assert!(!dir.path().join("slides/slide_000.png").exists());
    }
}
