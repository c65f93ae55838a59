use std::path::PathBuf;
use std::process::Command;

use image::ImageFormat;
use tempfile::NamedTempFile;

use super::preprocess::NormalizedImage;
use crate::error::PipelineError;

/// Raw OCR output split into lines, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    pub lines: Vec<String>,
}

impl RecognizedText {
    /// Splits an engine text blob on newlines. Carriage returns left over
    /// from CRLF output are dropped.
    pub fn from_blob(blob: &str) -> Self {
        let lines = blob
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self { lines }
    }
}

/// Runs optical character recognition over a normalized image.
pub trait Recognizer {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &str,
    ) -> Result<RecognizedText, PipelineError>;
}

impl<T: Recognizer + ?Sized> Recognizer for Box<T> {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &str,
    ) -> Result<RecognizedText, PipelineError> {
        (**self).recognize(image, language)
    }
}

/// Tesseract invoked as an external process.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata_dir: Option<PathBuf>,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(executable: PathBuf, tessdata_dir: Option<PathBuf>, psm: u8) -> Self {
        Self {
            executable,
            tessdata_dir,
            psm,
        }
    }

    fn command(&self, input: &std::path::Path, language: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.psm.to_string());
        cmd
    }
}

impl Recognizer for TesseractEngine {
    fn recognize(
        &self,
        image: &NormalizedImage,
        language: &str,
    ) -> Result<RecognizedText, PipelineError> {
        // Removed when dropped, on every return path
        let temp_input = NamedTempFile::with_suffix(".png").map_err(|e| {
            PipelineError::recognition(format!("failed to create temp image: {}", e))
        })?;
        image
            .pixels()
            .save_with_format(temp_input.path(), ImageFormat::Png)
            .map_err(|e| PipelineError::recognition(format!("failed to write temp image: {}", e)))?;

        log::debug!(
            "Running {} on {}",
            self.executable.display(),
            temp_input.path().display()
        );

        let output = self
            .command(temp_input.path(), language)
            .output()
            .map_err(|e| {
                PipelineError::recognition(format!(
                    "failed to start {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::recognition(format!(
                "tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let recognized = RecognizedText::from_blob(&text);
        log::debug!("Tesseract returned {} lines", recognized.lines.len());
        Ok(recognized)
    }
}

/// Recognizer that ignores the image and returns a fixed blob.
///
/// Used for dry runs against a known transcript and in tests.
#[derive(Debug, Clone)]
pub struct FixedRecognizer {
    text: String,
}

impl FixedRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Recognizer for FixedRecognizer {
    fn recognize(
        &self,
        _image: &NormalizedImage,
        _language: &str,
    ) -> Result<RecognizedText, PipelineError> {
        Ok(RecognizedText::from_blob(&self.text))
    }
}
