//! JSON Lines history file.
//!
//! One `ExtractionRecord` per line, append-only. Each append opens the file
//! in append mode, so a crash mid-run never damages rows already written.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::{latest_of, ExtractionRecord, HistoryStore};
use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads every well-formed record. A missing file is an empty history;
    /// malformed lines are skipped with a warning.
    fn load(&self) -> Result<Vec<ExtractionRecord>, PipelineError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PipelineError::store_read(format!(
                    "failed to open {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let mut records = Vec::new();
        for (line_num, line_result) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line_result.map_err(|e| {
                PipelineError::store_read(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // Invalid UTF-8 from a torn row surfaces here as a decode error
            match serde_json::from_slice::<ExtractionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!(
                    "Skipping malformed history row {} in {}: {}",
                    line_num + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        Ok(records)
    }
}

/// True for an empty file or one whose last byte is a newline.
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl HistoryStore for JsonlHistoryStore {
    fn find_latest(&self, user_id: &str) -> Result<Option<ExtractionRecord>, PipelineError> {
        let records = self.load()?;
        Ok(latest_of(records.iter().filter(|r| r.user_id == user_id)).cloned())
    }

    fn append(&self, record: &ExtractionRecord) -> Result<(), PipelineError> {
        let line = serde_json::to_string(record).map_err(PipelineError::store_write)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipelineError::store_write(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                PipelineError::store_write(format!(
                    "failed to open {} for append: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let write_err = |e: std::io::Error| {
            PipelineError::store_write(format!(
                "failed to write {}: {}",
                self.path.display(),
                e
            ))
        };

        let mut row = String::with_capacity(line.len() + 2);
        // Terminate a row left unfinished by an interrupted earlier append
        if !ends_with_newline(&mut file).map_err(write_err)? {
            log::warn!(
                "History file {} ends mid-row; starting a new line",
                self.path.display()
            );
            row.push('\n');
        }
        row.push_str(&line);
        row.push('\n');

        file.write_all(row.as_bytes()).map_err(write_err)
    }

    fn records(&self, user_id: &str) -> Result<Vec<ExtractionRecord>, PipelineError> {
        let mut records: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        // Stable: equal timestamps keep file order
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::ScoreMap;
    use tempfile::tempdir;

    fn record(user: &str, entries: &[(&str, u32)]) -> ExtractionRecord {
        let scores: ScoreMap = entries.iter().map(|&(s, v)| (s, v)).collect();
        ExtractionRecord::new(user, String::new(), scores)
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("history.jsonl"));
        assert!(store.find_latest("alice").unwrap().is_none());
        assert!(store.records("alice").unwrap().is_empty());
    }

    #[test]
    fn test_append_then_find_latest() {
        let dir = tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("nested/history.jsonl"));

        store.append(&record("alice", &[("Math", 70)])).unwrap();
        store.append(&record("bob", &[("Math", 10)])).unwrap();
        store.append(&record("alice", &[("Math", 85)])).unwrap();

        let latest = store.find_latest("alice").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(85));
        let latest = store.find_latest("bob").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(10));
        assert!(store.find_latest("carol").unwrap().is_none());
    }

    #[test]
    fn test_one_row_per_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = JsonlHistoryStore::new(&path);

        for i in 1..=3 {
            store.append(&record("alice", &[("Math", i)])).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(store.records("alice").unwrap().len(), 3);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = JsonlHistoryStore::new(&path);
        store.append(&record("alice", &[("Math", 60)])).unwrap();

        // Simulate a torn write followed by a good row
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"userId\":\"alice\",\"times").unwrap();
        writeln!(file).unwrap();
        drop(file);
        store.append(&record("alice", &[("Math", 65)])).unwrap();

        let records = store.records("alice").unwrap();
        assert_eq!(records.len(), 2);
        let latest = store.find_latest("alice").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(65));
    }

    #[test]
    fn test_append_after_unterminated_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = JsonlHistoryStore::new(&path);
        store.append(&record("alice", &[("Math", 60)])).unwrap();

        // Interrupted append: partial row, no trailing newline
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"userId":"alice","times"#).unwrap();
        drop(file);
        store.append(&record("alice", &[("Math", 90)])).unwrap();

        let latest = store.find_latest("alice").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(90));
        assert_eq!(store.records("alice").unwrap().len(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_invalid_utf8_row_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = JsonlHistoryStore::new(&path);
        store.append(&record("alice", &[("Math", 60)])).unwrap();

        // Row cut inside a multi-byte character ("\u{2014}" is e2 80 94)
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"userId\":\"bob\",\"extractedText\":\"Math \xe2\x80\n")
            .unwrap();
        drop(file);

        let latest = store.find_latest("alice").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(60));
        assert!(store.find_latest("bob").unwrap().is_none());

        store.append(&record("bob", &[("Math", 40)])).unwrap();
        let latest = store.find_latest("bob").unwrap().unwrap();
        assert_eq!(latest.scores.get("Math"), Some(40));
    }

    #[test]
    fn test_unwritable_path_is_write_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for append
        let store = JsonlHistoryStore::new(dir.path());
        let err = store.append(&record("alice", &[("Math", 1)])).unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::HistoryWrite);
    }
}
