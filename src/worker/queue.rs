//! Job queue feeding the extraction worker.
//!
//! Uses std::sync::mpsc channel for single-consumer communication. Producers
//! send image paths; the worker receives and processes them in order.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One image to extract scores from.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Path to the score report image
    pub image_path: PathBuf,
    /// User whose history the result is compared against
    pub user_id: String,
    /// Timestamp when the job was queued
    pub submitted_at: DateTime<Local>,
}

impl ExtractionJob {
    pub fn new(image_path: PathBuf, user_id: impl Into<String>) -> Self {
        Self {
            image_path,
            user_id: user_id.into(),
            submitted_at: Local::now(),
        }
    }
}

/// Creates a new job queue.
///
/// The channel is unbounded; jobs queue up while OCR is busy.
pub fn create_job_queue() -> (Sender<ExtractionJob>, Receiver<ExtractionJob>) {
    channel()
}
