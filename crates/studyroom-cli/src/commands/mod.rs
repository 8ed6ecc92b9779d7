pub mod config;
pub mod sessions;
pub mod stats;
pub mod timer;

use studyroom_core::storage::Database;
use studyroom_core::{Config, SystemClock, TimerStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The persisted timer, reloaded for this invocation.
pub fn open_store(config: &Config) -> Result<TimerStore<Database, SystemClock>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TimerStore::load(db, SystemClock, config.durations()))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
