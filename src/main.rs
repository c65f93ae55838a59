//! scorecard-ocr CLI
//!
//! Extracts subject scores from score report screenshots and compares them
//! against each user's previous upload.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use scorecard_ocr::history::{HistoryStore, JsonlHistoryStore};
use scorecard_ocr::ocr::{self, FixedRecognizer, Normalizer, RawImage, Recognizer};
use scorecard_ocr::worker::{create_job_queue, run_extraction_worker, ExtractionJob};
use scorecard_ocr::{paths, AppConfig, Pipeline};

/// Exit code when scores were extracted but could not be saved to history.
const EXIT_PARTIAL: i32 = 2;

#[derive(Parser)]
#[command(name = "scorecard-ocr", version, about = "Score report OCR and progress feedback")]
struct Cli {
    /// Config file path (default: <data dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract scores from one image and print the result as JSON
    Extract {
        /// User whose history the scores are compared against
        #[arg(long)]
        user: String,

        /// Use this transcript instead of running tesseract
        #[arg(long)]
        text: Option<PathBuf>,

        /// Score report image (PNG, JPEG, ...)
        image: PathBuf,
    },

    /// Extract scores from several images, in order, for one user
    Batch {
        #[arg(long)]
        user: String,

        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Print a user's stored extraction history as JSON lines
    History {
        #[arg(long)]
        user: String,
    },

    /// Download tesseract language data into the data directory
    Setup {
        /// Tesseract language code
        #[arg(long, default_value = "eng")]
        lang: String,
    },

    /// Print the effective configuration
    Config,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Extract { user, text, image } => extract(&config, &user, text.as_deref(), &image),
        Commands::Batch { user, images } => batch(&config, &user, images),
        Commands::History { user } => history(&config, &user),
        Commands::Setup { lang } => ocr::ensure_traineddata(&lang).map(|path| {
            println!("{}", path.display());
            0
        }),
        Commands::Config => serde_json::to_string_pretty(&config)
            .map(|json| {
                println!("{}", json);
                0
            })
            .map_err(Into::into),
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("{:#}", e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::from_file(path)?),
        None => Ok(AppConfig::load_or_default(&paths::get_config_path())),
    }
}

fn build_pipeline(
    config: &AppConfig,
    transcript: Option<&Path>,
) -> Result<Pipeline<Normalizer, Box<dyn Recognizer + Send>, JsonlHistoryStore>> {
    let recognizer: Box<dyn Recognizer + Send> = match transcript {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read transcript {}", path.display()))?;
            Box::new(FixedRecognizer::new(text))
        }
        None => Box::new(ocr::engine_from_config(&config.ocr)?),
    };

    let history_path = config.history_path();
    log::debug!("History file: {}", history_path.display());

    Ok(Pipeline::new(
        Normalizer::new(config.preprocess.clone()),
        recognizer,
        JsonlHistoryStore::new(history_path),
        config.ocr.language.clone(),
    ))
}

fn extract(config: &AppConfig, user: &str, transcript: Option<&Path>, image: &Path) -> Result<i32> {
    let pipeline = build_pipeline(config, transcript)?;
    let raw = RawImage::from_path(image)
        .with_context(|| format!("Failed to read image {}", image.display()))?;

    let outcome = pipeline.run(raw, user)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_partial() { EXIT_PARTIAL } else { 0 })
}

fn batch(config: &AppConfig, user: &str, images: Vec<PathBuf>) -> Result<i32> {
    let pipeline = build_pipeline(config, None)?;
    let (sender, receiver) = create_job_queue();

    let worker = thread::spawn(move || {
        let mut failures = 0;
        let mut partial = 0;
        run_extraction_worker(receiver, &pipeline, |job, result| match result {
            Ok(outcome) => {
                if outcome.is_partial() {
                    partial += 1;
                }
                let line = serde_json::json!({
                    "image": job.image_path.display().to_string(),
                    "result": outcome,
                });
                println!("{}", line);
            }
            Err(_) => failures += 1,
        });
        (failures, partial)
    });

    for image in images {
        sender.send(ExtractionJob::new(image, user))?;
    }
    drop(sender);

    let (failures, partial) = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Extraction worker panicked"))?;

    log::info!("Batch finished: {} failed, {} not saved", failures, partial);
    Ok(match (failures, partial) {
        (0, 0) => 0,
        (0, _) => EXIT_PARTIAL,
        _ => 1,
    })
}

fn history(config: &AppConfig, user: &str) -> Result<i32> {
    let store = JsonlHistoryStore::new(config.history_path());
    for record in store.records(user)? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(0)
}
