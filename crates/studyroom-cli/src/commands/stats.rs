use clap::Subcommand;
use serde_json::json;
use studyroom_core::storage::Database;
use studyroom_core::{Config, DailyProgress};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats and progress toward the daily goal
    Today,
    /// All-time stats
    All,
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let config = Config::load_or_default();
            let stats = db.stats_today()?;
            let progress = DailyProgress::new(stats.today_study_min, config.daily_study_hours_goal);
            print_json(&json!({ "stats": stats, "progress": progress }))?;
        }
        StatsAction::All => {
            let stats = db.stats_all()?;
            print_json(&stats)?;
        }
    }
    Ok(())
}
