//! Data directory configuration.
//!
//! Precedence:
//! 1. OTHELLO_COACH_DATA_DIR environment variable
//! 2. ~/.config/othello-coach/data (production default)
//! 3. ./data (fallback for development)

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/othello-coach/data";
const DEV_DATA_DIR: &str = "./data";

/// Database file name inside the data directory.
const DB_FILE: &str = "knowledge.sqlite3";

/// Get the data directory for persistence.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OTHELLO_COACH_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Default path of the knowledge store database file.
pub fn db_path() -> PathBuf {
    get_data_dir().join(DB_FILE)
}
