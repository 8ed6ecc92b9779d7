use clap::Subcommand;
use studyroom_core::storage::Database;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// Most recent study sessions
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub fn run(action: SessionsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        SessionsAction::List { limit } => {
            let sessions = db.list_sessions(limit)?;
            print_json(&sessions)?;
        }
    }
    Ok(())
}
