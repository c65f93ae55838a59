//! End-to-end extraction: image → scores → feedback → history.

use serde::Serialize;

use crate::error::PipelineError;
use crate::feedback::{synthesize, FeedbackMessage};
use crate::history::{ExtractionRecord, HistoryStore};
use crate::ocr::engine::Recognizer;
use crate::ocr::extract::parse;
use crate::ocr::filter::filter;
use crate::ocr::preprocess::{ImageProcessor, RawImage};
use crate::scores::ScoreMap;

/// What one run returns to its caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    /// Newline-joined filtered OCR text
    pub filtered_text: String,
    pub scores: ScoreMap,
    pub feedback: Vec<FeedbackMessage>,
    /// Set when extraction succeeded but the history write failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

impl ExtractionOutcome {
    /// True when the result was extracted but not recorded.
    pub fn is_partial(&self) -> bool {
        self.store_error.is_some()
    }
}

/// The extraction pipeline with its collaborators injected.
///
/// Holds no per-run state; one instance can serve many runs in sequence.
pub struct Pipeline<P, R, S> {
    processor: P,
    recognizer: R,
    store: S,
    language: String,
}

impl<P, R, S> Pipeline<P, R, S>
where
    P: ImageProcessor,
    R: Recognizer,
    S: HistoryStore,
{
    pub fn new(processor: P, recognizer: R, store: S, language: impl Into<String>) -> Self {
        Self {
            processor,
            recognizer,
            store,
            language: language.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one extraction for `user_id`.
    ///
    /// Decode and recognition failures abort the run. A failed history read
    /// is treated as an empty history; a failed history write is reported
    /// in [`ExtractionOutcome::store_error`].
    pub fn run(&self, image: RawImage, user_id: &str) -> Result<ExtractionOutcome, PipelineError> {
        log::info!("Extraction for {}: normalizing image", user_id);
        let normalized = self.processor.normalize(image)?;

        log::info!(
            "Extraction for {}: recognizing {}x{} image",
            user_id,
            normalized.dimensions().0,
            normalized.dimensions().1
        );
        let recognized = self.recognizer.recognize(&normalized, &self.language)?;
        // Image buffers are not needed past recognition
        drop(normalized);

        let filtered = filter(&recognized);
        let scores = parse(&filtered);
        log::info!(
            "Extraction for {}: {} of {} lines kept, {} subjects parsed",
            user_id,
            filtered.lines.len(),
            recognized.lines.len(),
            scores.len()
        );

        let previous = match self.store.find_latest(user_id) {
            Ok(record) => record.map(|r| r.scores),
            Err(e) => {
                log::warn!("{}; treating history as empty", e);
                None
            }
        };

        let feedback = synthesize(previous.as_ref(), &scores);

        let filtered_text = filtered.joined();
        let record = ExtractionRecord::new(user_id, filtered_text.clone(), scores.clone());
        let store_error = match self.store.append(&record) {
            Ok(()) => None,
            Err(e) => {
                log::error!("{}", e);
                Some(e.to_string())
            }
        };

        Ok(ExtractionOutcome {
            filtered_text,
            scores,
            feedback,
            store_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::ocr::engine::{FixedRecognizer, RecognizedText};
    use crate::ocr::preprocess::NormalizedImage;
    use image::GrayImage;

    /// Skips decoding; rejects empty input.
    struct FakeProcessor;

    impl ImageProcessor for FakeProcessor {
        fn normalize(&self, image: RawImage) -> Result<NormalizedImage, PipelineError> {
            if image.bytes.is_empty() {
                return Err(PipelineError::image_decode("empty input"));
            }
            Ok(NormalizedImage::new(GrayImage::new(8, 8)))
        }
    }

    struct FailingRecognizer;

    impl Recognizer for FailingRecognizer {
        fn recognize(
            &self,
            _image: &NormalizedImage,
            _language: &str,
        ) -> Result<RecognizedText, PipelineError> {
            Err(PipelineError::recognition("engine timed out"))
        }
    }

    /// Every read and write fails.
    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn find_latest(&self, _user_id: &str) -> Result<Option<ExtractionRecord>, PipelineError> {
            Err(PipelineError::store_read("connection refused"))
        }

        fn append(&self, _record: &ExtractionRecord) -> Result<(), PipelineError> {
            Err(PipelineError::store_write("connection refused"))
        }

        fn records(&self, _user_id: &str) -> Result<Vec<ExtractionRecord>, PipelineError> {
            Err(PipelineError::store_read("connection refused"))
        }
    }

    fn image() -> RawImage {
        RawImage::new(vec![1, 2, 3])
    }

    fn pipeline(text: &str) -> Pipeline<FakeProcessor, FixedRecognizer, MemoryHistoryStore> {
        Pipeline::new(
            FakeProcessor,
            FixedRecognizer::new(text),
            MemoryHistoryStore::new(),
            "eng",
        )
    }

    #[test]
    fn test_first_run_reports_new_scores() {
        let pipeline = pipeline("Math 85\nChemistry 78\nOverall CGPA: 8.1");
        let outcome = pipeline.run(image(), "alice").unwrap();

        assert_eq!(outcome.filtered_text, "Math 85\nChemistry 78\nOverall CGPA: 8.1");
        let entries: Vec<_> = outcome.scores.iter().collect();
        assert_eq!(entries, vec![("Math", 85), ("Chemistry", 78)]);

        assert_eq!(outcome.feedback.len(), 2);
        assert!(outcome.feedback[0].text.contains("New score recorded for Math: 85."));
        assert!(outcome.feedback[1].text.contains("New score recorded for Chemistry: 78."));
        assert!(!outcome.is_partial());
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_second_run_compares_against_latest() {
        let first = pipeline("Math 70\nChemistry 78");
        first.run(image(), "alice").unwrap();

        let previous = first.store().records("alice").unwrap();
        let second = Pipeline::new(
            FakeProcessor,
            FixedRecognizer::new("Math 85\nChemistry 78\nPhysics 60"),
            MemoryHistoryStore::with_records(previous),
            "eng",
        );
        let outcome = second.run(image(), "alice").unwrap();

        let texts: Vec<_> = outcome.feedback.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Great job on improving your Math score by 15 points!",
                "New score recorded for Physics: 60. Keep up the good work!",
            ]
        );
        assert_eq!(second.store().len(), 2);
    }

    #[test]
    fn test_history_is_per_user() {
        let pipeline = pipeline("Math 85");
        pipeline.run(image(), "alice").unwrap();
        let outcome = pipeline.run(image(), "bob").unwrap();
        assert!(outcome.feedback[0].text.starts_with("New score recorded"));
    }

    #[test]
    fn test_decode_failure_aborts_without_writing() {
        let pipeline = pipeline("Math 85");
        let err = pipeline.run(RawImage::new(Vec::new()), "alice").unwrap_err();
        assert!(matches!(err, PipelineError::ImageDecode { .. }));
        assert!(pipeline.store().is_empty());
    }

    #[test]
    fn test_recognition_failure_aborts_without_writing() {
        let pipeline = Pipeline::new(
            FakeProcessor,
            FailingRecognizer,
            MemoryHistoryStore::new(),
            "eng",
        );
        let err = pipeline.run(image(), "alice").unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::Recognize);
        assert!(pipeline.store().is_empty());
    }

    #[test]
    fn test_store_failures_degrade() {
        let pipeline = Pipeline::new(
            FakeProcessor,
            FixedRecognizer::new("Math 85"),
            BrokenStore,
            "eng",
        );
        let outcome = pipeline.run(image(), "alice").unwrap();

        // Read failure behaves like an empty history
        assert_eq!(outcome.feedback.len(), 1);
        assert!(outcome.feedback[0].text.starts_with("New score recorded for Math"));
        // Write failure is surfaced, not fatal
        assert!(outcome.is_partial());
        assert!(outcome.store_error.unwrap().contains("[history-write]"));
    }

    #[test]
    fn test_nothing_parsed_still_recorded() {
        let pipeline = pipeline("Results\n\n");
        let outcome = pipeline.run(image(), "alice").unwrap();
        assert!(outcome.scores.is_empty());
        assert!(outcome.feedback.is_empty());
        assert_eq!(outcome.filtered_text, "");
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_outcome_json() {
        let pipeline = pipeline("Math 85");
        let outcome = pipeline.run(image(), "alice").unwrap();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["filteredText"], "Math 85");
        assert_eq!(json["scores"]["Math"], 85);
        assert_eq!(
            json["feedback"][0],
            "New score recorded for Math: 85. Keep up the good work!"
        );
        assert!(json.get("storeError").is_none());
    }
}
