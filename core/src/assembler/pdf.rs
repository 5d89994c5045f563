use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream};
use slide_capture_common::frame::Frame;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_RESOLUTION_DPI: f64 = 100.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

const POINTS_PER_INCH: f64 = 72.0;
const IMAGE_NAME: &str = "Im0";

/// Size and origin of one page in an assembled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Capture index of the frame shown on this page.
    pub frame_index: u64,
    pub width_px: u32,
    pub height_px: u32,
    pub width_pt: i64,
    pub height_pt: i64,
}

/// A finished PDF, one page per slide in capture order.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    pages: Vec<PageInfo>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("no frames to assemble")]
    EmptyInput,
    #[error("failed to encode frame {index} as JPEG: {reason}")]
    Encode { index: u64, reason: String },
    #[error("failed to build PDF: {0}")]
    Pdf(String),
}

/// Turns an ordered list of slides into a PDF.
///
/// Every frame becomes one page sized `pixels * 72 / resolution_dpi` points,
/// showing the frame as a full-bleed JPEG image. Pages keep input order and
/// nothing is deduplicated here.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    resolution_dpi: f64,
    jpeg_quality: u8,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_DPI, DEFAULT_JPEG_QUALITY)
    }
}

impl DocumentAssembler {
    /// A `resolution_dpi` that is not a positive finite number falls back to
    /// [`DEFAULT_RESOLUTION_DPI`].
    pub fn new(resolution_dpi: f64, jpeg_quality: u8) -> Self {
        let resolution_dpi = if resolution_dpi.is_finite() && resolution_dpi > 0.0 {
            resolution_dpi
        } else {
            warn!(
                resolution_dpi,
                fallback = DEFAULT_RESOLUTION_DPI,
                "invalid resolution, using default"
            );
            DEFAULT_RESOLUTION_DPI
        };
        Self {
            resolution_dpi,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn assemble(&self, frames: &[Frame]) -> Result<Document, AssembleError> {
        if frames.is_empty() {
            return Err(AssembleError::EmptyInput);
        }

        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(frames.len());
        let mut pages = Vec::with_capacity(frames.len());

        for frame in frames {
            let page = self.page_info(frame);
            let jpeg = self.encode_jpeg(frame)?;

            let image_id = pdf.add_object(
                Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => i64::from(page.width_px),
                        "Height" => i64::from(page.height_px),
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8_i64,
                        "Filter" => "DCTDecode",
                    },
                    jpeg,
                )
                .with_compression(false),
            );

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            Object::Integer(page.width_pt),
                            Object::Integer(0),
                            Object::Integer(0),
                            Object::Integer(page.height_pt),
                            Object::Integer(0),
                            Object::Integer(0),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let content_bytes = content
                .encode()
                .map_err(|e| AssembleError::Pdf(e.to_string()))?;
            let content_id = pdf.add_object(Stream::new(Dictionary::new(), content_bytes));

            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(page.width_pt),
                    Object::Integer(page.height_pt),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        IMAGE_NAME => image_id,
                    },
                },
            });
            kids.push(page_id.into());

            debug!(
                frame_index = page.frame_index,
                width_pt = page.width_pt,
                height_pt = page.height_pt,
                "added page"
            );
            pages.push(page);
        }

        let count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes)
            .map_err(|e| AssembleError::Pdf(e.to_string()))?;

        info!(
            pages = pages.len(),
            bytes = bytes.len(),
            dpi = self.resolution_dpi,
            "document assembled"
        );

        Ok(Document { bytes, pages })
    }

    fn page_info(&self, frame: &Frame) -> PageInfo {
        let (width_px, height_px) = frame.dimensions();
        PageInfo {
            frame_index: frame.index,
            width_px,
            height_px,
            width_pt: self.to_points(width_px),
            height_pt: self.to_points(height_px),
        }
    }

    fn to_points(&self, pixels: u32) -> i64 {
        ((f64::from(pixels) * POINTS_PER_INCH / self.resolution_dpi).round() as i64).max(1)
    }

    fn encode_jpeg(&self, frame: &Frame) -> Result<Vec<u8>, AssembleError> {
        let rgb: RgbImage = frame.image().convert();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| AssembleError::Encode {
                index: frame.index,
                reason: e.to_string(),
            })?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn frame(index: u64, width: u32, height: u32) -> Frame {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, (index * 60 % 256) as u8, 255])
        });
        Frame::new(index, 0, img)
    }

    fn media_box_widths(bytes: &[u8]) -> Vec<i64> {
        let pdf = lopdf::Document::load_mem(bytes).unwrap();
        pdf.get_pages()
            .values()
            .map(|&id| {
                let page = pdf.get_dictionary(id).unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = DocumentAssembler::default().assemble(&[]).unwrap_err();
        assert!(matches!(err, AssembleError::EmptyInput));
    }

    #[test]
    fn one_page_per_frame() {
        let frames: Vec<Frame> = (0..4).map(|i| frame(i, 50, 40)).collect();
        let doc = DocumentAssembler::default().assemble(&frames).unwrap();
        assert_eq!(doc.page_count(), 4);

        let pdf = lopdf::Document::load_mem(doc.as_bytes()).unwrap();
        assert_eq!(pdf.get_pages().len(), 4);
        assert!(doc.as_bytes().starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn pages_keep_input_order() {
        // Distinct widths make the page order observable in the PDF.
        let frames = vec![frame(7, 300, 100), frame(2, 100, 100), frame(9, 200, 100)];
        let doc = DocumentAssembler::new(72.0, 80).assemble(&frames).unwrap();

        let indices: Vec<u64> = doc.pages().iter().map(|p| p.frame_index).collect();
        assert_eq!(indices, vec![7, 2, 9]);
        assert_eq!(media_box_widths(doc.as_bytes()), vec![300, 100, 200]);
    }

    #[test]
    fn invalid_resolution_uses_default() {
        for dpi in [0.0, -72.0, f64::NAN, f64::INFINITY] {
            let doc = DocumentAssembler::new(dpi, 90)
                .assemble(&[frame(0, 100, 50)])
                .unwrap();
            let page = &doc.pages()[0];
            assert_eq!((page.width_pt, page.height_pt), (72, 36));
            assert_eq!(media_box_widths(doc.as_bytes()), vec![72]);
        }
    }

    #[test]
    fn page_size_follows_resolution() {
        let doc = DocumentAssembler::new(100.0, 90)
            .assemble(&[frame(0, 1920, 1080)])
            .unwrap();
        let page = &doc.pages()[0];
        assert_eq!((page.width_px, page.height_px), (1920, 1080));
        // 1920 * 72 / 100 = 1382.4, 1080 * 72 / 100 = 777.6
        assert_eq!((page.width_pt, page.height_pt), (1382, 778));
    }

    #[test]
    fn save_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pdf");
        let doc = DocumentAssembler::default()
            .assemble(&[frame(0, 20, 10)])
            .unwrap();
        doc.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), doc.as_bytes());
    }
}
