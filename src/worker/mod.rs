//! Background extraction for batches of images.
//!
//! Jobs are processed one at a time so each run sees the history written by
//! the one before it.

pub mod queue;

pub use queue::{create_job_queue, ExtractionJob};

use std::sync::mpsc::Receiver;

use crate::error::PipelineError;
use crate::history::HistoryStore;
use crate::ocr::engine::Recognizer;
use crate::ocr::preprocess::{ImageProcessor, RawImage};
use crate::pipeline::{ExtractionOutcome, Pipeline};

/// Runs the extraction worker loop.
///
/// Processes jobs until the channel is closed (all senders dropped). A failed
/// job is logged and handed to `on_result`; it never stops the loop.
///
/// Blocks until the channel closes, so run it on a dedicated thread.
/// Returns the number of jobs processed.
pub fn run_extraction_worker<P, R, S, F>(
    receiver: Receiver<ExtractionJob>,
    pipeline: &Pipeline<P, R, S>,
    mut on_result: F,
) -> usize
where
    P: ImageProcessor,
    R: Recognizer,
    S: HistoryStore,
    F: FnMut(&ExtractionJob, Result<ExtractionOutcome, PipelineError>),
{
    log::info!("Extraction worker started");
    let mut processed = 0;

    // Loop ends when the channel is closed
    while let Ok(job) = receiver.recv() {
        log::info!(
            "Extraction worker: processing {} for {}",
            job.image_path.display(),
            job.user_id
        );

        let result = RawImage::from_path(&job.image_path)
            .map_err(|e| {
                PipelineError::image_decode(format!(
                    "failed to read {}: {}",
                    job.image_path.display(),
                    e
                ))
            })
            .and_then(|image| pipeline.run(image, &job.user_id));

        if let Err(e) = &result {
            log::error!(
                "Extraction worker: {} failed: {}",
                job.image_path.display(),
                e
            );
        }

        on_result(&job, result);
        processed += 1;
    }

    log::info!("Extraction worker finished ({} jobs)", processed);
    processed
}
