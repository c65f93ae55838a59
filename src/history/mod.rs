//! Durable record of past extraction runs, per user.
//!
//! This module provides:
//! - The `ExtractionRecord` persisted after each successful run
//! - The `HistoryStore` trait the pipeline reads from and appends to
//! - An append-only JSON Lines store and an in-memory store

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlHistoryStore;
pub use memory::MemoryHistoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::scores::ScoreMap;

/// One completed extraction run. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Newline-joined filtered OCR text
    pub extracted_text: String,
    pub scores: ScoreMap,
}

impl ExtractionRecord {
    pub fn new(user_id: impl Into<String>, extracted_text: String, scores: ScoreMap) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: Utc::now(),
            extracted_text,
            scores,
        }
    }
}

/// Storage for extraction history.
///
/// Reads and writes are independent; no transaction spans a
/// `find_latest` and the following `append`.
pub trait HistoryStore {
    /// Most recent record for `user_id`, if any.
    fn find_latest(&self, user_id: &str) -> Result<Option<ExtractionRecord>, PipelineError>;

    fn append(&self, record: &ExtractionRecord) -> Result<(), PipelineError>;

    /// All records for `user_id`, oldest first.
    fn records(&self, user_id: &str) -> Result<Vec<ExtractionRecord>, PipelineError>;
}

/// Picks the newest record; on equal timestamps the later one wins.
pub(crate) fn latest_of<'a>(
    records: impl Iterator<Item = &'a ExtractionRecord>,
) -> Option<&'a ExtractionRecord> {
    records.fold(None::<&ExtractionRecord>, |best, record| match best {
        Some(b) if b.timestamp > record.timestamp => Some(b),
        _ => Some(record),
    })
}
