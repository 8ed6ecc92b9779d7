mod config;
pub mod database;
pub mod kv;

pub use config::{Config, PomodoroConfig};
pub use database::{Database, DailyProgress, NewStudySession, SessionCategory, Stats, StudySession};
pub use kv::{KvStore, MemoryStore};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the data directory, creating it if needed.
///
/// `STUDYROOM_DATA_DIR` wins when set. Otherwise `~/.config/studyroom[-dev]/`,
/// with the `-dev` suffix when `STUDYROOM_ENV=dev`.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYROOM_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyroom-dev")
            } else {
                base_dir.join("studyroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
