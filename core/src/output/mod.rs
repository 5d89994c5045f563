//! Everything the capture run leaves on disk: slide images, the document,
//! the manifest and partial dumps of failed runs.

pub mod keys;

use serde::Serialize;
use slide_capture_common::frame::{Frame, FrameError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::assembler::Document;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to create folder {0}: {1}")]
    CreateDir(String, std::io::Error),
    #[error("failed to write {0}: {1}")]
    Write(String, std::io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// One slide entry in `manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SlideRecord {
    pub page: usize,
    pub capture_index: u64,
    pub width: u32,
    pub height: u32,
    pub captured_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub source_url: String,
    pub document: String,
    pub slide_count: usize,
    pub slides: Vec<SlideRecord>,
    pub generated_at: String,
}

impl Manifest {
    pub fn new(
        source_url: &str,
        document: &str,
        frames: &[Frame],
        image_names: Option<&[String]>,
        generated_at_ms: i64,
    ) -> Self {
        let slides = frames
            .iter()
            .enumerate()
            .map(|(position, frame)| SlideRecord {
                page: position + 1,
                capture_index: frame.index,
                width: frame.width(),
                height: frame.height(),
                captured_at: keys::rfc3339(frame.captured_at_ms),
                image: image_names.and_then(|names| names.get(position).cloned()),
            })
            .collect();
        Self {
            source_url: source_url.to_string(),
            document: document.to_string(),
            slide_count: frames.len(),
            slides,
            generated_at: keys::rfc3339(generated_at_ms),
        }
    }
}

/// Writes run artifacts into one output folder.
#[derive(Debug, Clone)]
pub struct SlideWriter {
    folder: PathBuf,
}

impl SlideWriter {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Create the output folder if it does not exist yet.
    pub fn ensure_folder(&self) -> Result<(), OutputError> {
        std::fs::create_dir_all(&self.folder)
            .map_err(|e| OutputError::CreateDir(self.folder.display().to_string(), e))
    }

    /// Write each slide as `slide_NNN.png`, numbered by position.
    /// Returns the file names in slide order.
    pub fn write_slides(&self, frames: &[Frame]) -> Result<Vec<String>, OutputError> {
        write_pngs(&self.folder, frames)
    }

    pub fn write_document(&self, doc: &Document, name: &str) -> Result<PathBuf, OutputError> {
        let path = self.folder.join(name);
        doc.save(&path)
            .map_err(|e| OutputError::Write(path.display().to_string(), e))?;
        info!(path = %path.display(), pages = doc.page_count(), "document written");
        Ok(path)
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> Result<PathBuf, OutputError> {
        let path = self.folder.join(keys::MANIFEST_NAME);
        let json = serde_json::to_string_pretty(manifest)?;
        std::fs::write(&path, json)
            .map_err(|e| OutputError::Write(path.display().to_string(), e))?;
        debug!(path = %path.display(), "manifest written");
        Ok(path)
    }

    /// Persist frames from an aborted run under `partial_<timestamp>/`.
    /// These are for postmortem only and never assembled.
    pub fn dump_partial(&self, frames: &[Frame], failed_at_ms: i64) -> Result<PathBuf, OutputError> {
        let dir = self.folder.join(keys::partial_dir_name(failed_at_ms));
        std::fs::create_dir_all(&dir)
            .map_err(|e| OutputError::CreateDir(dir.display().to_string(), e))?;
        write_pngs(&dir, frames)?;
        info!(path = %dir.display(), frames = frames.len(), "partial frames dumped");
        Ok(dir)
    }

    /// Save an HTML snapshot of the viewer for debugging.
    pub fn write_page_source(&self, name: &str, html: &str) -> Result<PathBuf, OutputError> {
        let path = self.folder.join(name);
        std::fs::write(&path, html)
            .map_err(|e| OutputError::Write(path.display().to_string(), e))?;
        info!(path = %path.display(), "page source saved");
        Ok(path)
    }
}

fn write_pngs(dir: &Path, frames: &[Frame]) -> Result<Vec<String>, OutputError> {
    let mut names = Vec::with_capacity(frames.len());
    for (position, frame) in frames.iter().enumerate() {
        let name = keys::slide_image_name(position);
        let path = dir.join(&name);
        let png = frame.encode_png()?;
        std::fs::write(&path, png).map_err(|e| OutputError::Write(path.display().to_string(), e))?;
        debug!(path = %path.display(), index = frame.index, "slide image written");
        names.push(name);
    }
    Ok(names)
}
