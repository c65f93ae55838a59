use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::engine::TesseractEngine;
use crate::config::OcrConfig;
use crate::paths::{get_tessdata_dir, get_tesseract_dir};

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_EXECUTABLE_PATHS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];
#[cfg(not(windows))]
const COMMON_EXECUTABLE_PATHS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Builds a tesseract engine from configuration, locating the executable
/// and tessdata directory.
pub fn engine_from_config(config: &OcrConfig) -> Result<TesseractEngine> {
    let executable = find_tesseract_executable(config)?;
    let tessdata = find_tessdata_dir(config);
    log::info!(
        "Using tesseract at {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "engine default".to_string())
    );
    Ok(TesseractEngine::new(executable, tessdata, config.psm))
}

/// Finds the Tesseract executable: configured path, then our data dir,
/// then PATH, then common install locations.
pub fn find_tesseract_executable(config: &OcrConfig) -> Result<PathBuf> {
    if let Some(path) = &config.tesseract_path {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(anyhow!(
            "Configured tesseract_path does not exist: {}",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    if responds_to_version("tesseract") {
        return Ok(PathBuf::from("tesseract"));
    }

    COMMON_EXECUTABLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            anyhow!(
                "Tesseract not found. Install Tesseract-OCR, add it to PATH, \
                 or set ocr.tesseract_path in the config file."
            )
        })
}

fn responds_to_version(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Finds a tessdata directory holding `<language>.traineddata`.
///
/// Returns `None` when nothing is found, leaving tesseract to its
/// compiled-in default.
pub fn find_tessdata_dir(config: &OcrConfig) -> Option<PathBuf> {
    if let Some(dir) = &config.tessdata_dir {
        return Some(dir.clone());
    }

    let traineddata = format!("{}.traineddata", config.language);

    let local = get_tessdata_dir();
    if local.join(&traineddata).exists() {
        return Some(local);
    }

    let prefix = PathBuf::from(std::env::var_os("TESSDATA_PREFIX")?);
    [prefix.clone(), prefix.join("tessdata")]
        .into_iter()
        .find(|p| p.join(&traineddata).exists())
}

/// Ensures `<language>.traineddata` is present in our tessdata directory,
/// downloading it if necessary. Returns the file path.
pub fn ensure_traineddata(language: &str) -> Result<PathBuf> {
    let tessdata_dir = get_tessdata_dir();
    let path = tessdata_dir.join(format!("{}.traineddata", language));

    if path.exists() {
        log::info!("{} already present", path.display());
        return Ok(path);
    }

    fs::create_dir_all(&tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;
    download_traineddata(language, &path)?;
    Ok(path)
}

fn download_traineddata(language: &str, dest: &Path) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    log::info!("Downloading {}...", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "scorecard-ocr")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;

    // Renamed into place only once fully written
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow!("Invalid destination: {}", dest.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(&bytes)?;
    file.persist(dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    log::info!(
        "Downloaded {}.traineddata ({} bytes)",
        language,
        bytes.len()
    );

    Ok(())
}
