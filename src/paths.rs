use std::path::PathBuf;

const APP_DIR_NAME: &str = "scorecard-ocr";

/// Returns the per-user data directory: `<local data dir>/scorecard-ocr/`
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Returns the default config file: `<data dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Returns the default history file: `<data dir>/history.jsonl`
pub fn get_history_path() -> PathBuf {
    get_data_dir().join("history.jsonl")
}

/// Returns the local tesseract directory: `<data dir>/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    get_data_dir().join("tesseract")
}

/// Returns the local tessdata directory: `<data dir>/tesseract/tessdata/`
pub fn get_tessdata_dir() -> PathBuf {
    get_tesseract_dir().join("tessdata")
}
