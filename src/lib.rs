//! Score report extraction.
//!
//! Turns a screenshot of a score report into a subject → score mapping and
//! feedback against the student's previous upload:
//!
//! normalize image → OCR → keep table/GPA lines → parse scores →
//! compare with latest history record → append new record.

pub mod config;
pub mod error;
pub mod feedback;
pub mod history;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod scores;
pub mod worker;

pub use config::AppConfig;
pub use error::{PipelineError, Stage};
pub use feedback::{synthesize, FeedbackKind, FeedbackMessage};
pub use history::{ExtractionRecord, HistoryStore, JsonlHistoryStore, MemoryHistoryStore};
pub use pipeline::{ExtractionOutcome, Pipeline};
pub use scores::ScoreMap;
