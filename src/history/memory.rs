use std::sync::{Mutex, PoisonError};

use super::{latest_of, ExtractionRecord, HistoryStore};
use crate::error::PipelineError;

/// History kept in process memory. Lost on exit.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<ExtractionRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ExtractionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn find_latest(&self, user_id: &str) -> Result<Option<ExtractionRecord>, PipelineError> {
        let records = self
            .records
            .lock()
            .map_err(|_| PipelineError::store_read("history lock poisoned"))?;
        Ok(latest_of(records.iter().filter(|r| r.user_id == user_id)).cloned())
    }

    fn append(&self, record: &ExtractionRecord) -> Result<(), PipelineError> {
        self.records
            .lock()
            .map_err(|_| PipelineError::store_write("history lock poisoned"))?
            .push(record.clone());
        Ok(())
    }

    fn records(&self, user_id: &str) -> Result<Vec<ExtractionRecord>, PipelineError> {
        let records = self
            .records
            .lock()
            .map_err(|_| PipelineError::store_read("history lock poisoned"))?;
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }
}
