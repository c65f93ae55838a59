use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, ImageReader, Limits};

use crate::config::PreprocessConfig;
use crate::error::PipelineError;

/// Undecoded image bytes as uploaded, plus the format if the caller knows it.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub format: Option<ImageFormat>,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: None,
        }
    }

    pub fn with_format(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            bytes,
            format: Some(format),
        }
    }

    /// Reads an image file without decoding it. The file extension is kept
    /// as a format hint.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            bytes,
            format: ImageFormat::from_path(path).ok(),
        })
    }
}

/// Grayscale image ready for recognition.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pixels: GrayImage,
}

impl NormalizedImage {
    pub fn new(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Turns an uploaded image into something the recognizer reads well.
pub trait ImageProcessor {
    fn normalize(&self, raw: RawImage) -> Result<NormalizedImage, PipelineError>;
}

/// Default processor: fixed-width resize, grayscale, unsharp mask.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: PreprocessConfig,
}

impl Normalizer {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Decoder allocation cap: `max_pixels` at up to 4 bytes per pixel.
    fn decode_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.config.max_pixels.saturating_mul(4));
        limits
    }
}

impl ImageProcessor for Normalizer {
    fn normalize(&self, raw: RawImage) -> Result<NormalizedImage, PipelineError> {
        // Content wins over a possibly misleading file extension
        let format = image::guess_format(&raw.bytes)
            .ok()
            .or(raw.format)
            .ok_or_else(|| PipelineError::image_decode("unrecognized image format"))?;
        let mut reader = ImageReader::with_format(Cursor::new(&raw.bytes), format);
        reader.limits(self.decode_limits());
        let decoded = reader.decode().map_err(PipelineError::image_decode)?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(PipelineError::image_decode(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        let (target_width, target_height) =
            scaled_dimensions(width, height, self.config.target_width);
        let output_pixels = u64::from(target_width) * u64::from(target_height);
        if output_pixels > self.config.max_pixels {
            return Err(PipelineError::image_decode(format!(
                "{}x{} image would normalize to {}x{}, over the {} pixel limit",
                width, height, target_width, target_height, self.config.max_pixels
            )));
        }
        log::debug!(
            "Normalizing {:?} image {}x{} -> {}x{}",
            format,
            width,
            height,
            target_width,
            target_height
        );

        let resized = decoded.resize_exact(target_width, target_height, FilterType::Lanczos3);
        let gray = resized.to_luma8();
        let sharpened = imageops::unsharpen(
            &gray,
            self.config.sharpen_sigma,
            self.config.sharpen_threshold,
        );

        Ok(NormalizedImage::new(sharpened))
    }
}

/// Aspect-preserving dimensions for a fixed output width.
///
/// Both upscaling and downscaling apply; height never drops below 1.
pub fn scaled_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let target_width = target_width.max(1);
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    (target_width, scaled.max(1))
}
