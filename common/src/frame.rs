use image::{ImageReader, RgbaImage};
use std::io::Cursor;

/// A captured render of the presentation surface.
///
/// Frames are immutable once built. `index` is the 0-based capture attempt
/// number assigned by the capture loop, so it keeps increasing across
/// discarded captures and is not the slide number.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    /// Wall-clock capture time, Unix millis.
    pub captured_at_ms: i64,
    image: RgbaImage,
}

impl Frame {
    pub fn new(index: u64, captured_at_ms: i64, image: RgbaImage) -> Self {
        Self {
            index,
            captured_at_ms,
            image,
        }
    }

    /// Decode an encoded screenshot (PNG, JPEG). The format is guessed from
    /// the leading bytes.
    pub fn decode(index: u64, captured_at_ms: i64, encoded: &[u8]) -> Result<Self, FrameError> {
        let img = ImageReader::new(Cursor::new(encoded))
            .with_guessed_format()
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok(Self::new(index, captured_at_ms, img.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Encode as PNG, the format intermediate slide images are kept in.
    pub fn encode_png(&self) -> Result<Vec<u8>, FrameError> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to decode frame image: {0}")]
    Decode(String),
    #[error("failed to encode frame image: {0}")]
    Encode(String),
}
