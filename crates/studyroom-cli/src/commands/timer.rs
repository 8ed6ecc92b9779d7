use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use studyroom_core::events::Event;
use studyroom_core::storage::Database;
use studyroom_core::timer::ticker::{self, TickOutcome, TICK_PERIOD};
use studyroom_core::timer::format_remaining;
use studyroom_core::{Config, NewStudySession, SessionCategory, SessionKind, SystemClock, TimerStore};

use super::{open_store, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Visibility {
    Show,
    Hide,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the current phase
    Start,
    /// Pause the running phase
    Pause,
    /// Back to an idle Work phase with zero cycles
    Reset,
    /// End a break early, or give up the Work phase and take its break
    Skip,
    /// Close the Work phase, optionally logging it, and start the break
    Complete {
        /// Log the session as not productive
        #[arg(long)]
        unproductive: bool,
        /// Subject studied; logs a session together with --topic
        #[arg(long, requires = "topic")]
        subject: Option<String>,
        /// Topic studied
        #[arg(long, requires = "subject")]
        topic: Option<String>,
        /// study, revision or practice
        #[arg(long, default_value = "study")]
        category: SessionCategory,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Set the length of the Work phase in minutes (ignored while running)
    Duration { minutes: u32 },
    /// Switch phase while idle (work, short-break, long-break)
    Phase { kind: SessionKind },
    /// Show or hide the floating widget
    Widget {
        #[arg(value_enum)]
        visibility: Visibility,
    },
    /// Print current timer state
    Status {
        /// One line: label and MM:SS
        #[arg(long)]
        plain: bool,
    },
    /// Follow the running timer once a second until it stops or a phase ends
    Watch,
}

fn plain_line(event: &Event) -> Option<String> {
    match event {
        Event::StateSnapshot {
            label,
            remaining_secs,
            is_running,
            ..
        } => {
            let state = if *is_running { "" } else { " (paused)" };
            Some(format!("{label} {}{state}", format_remaining(*remaining_secs)))
        }
        _ => None,
    }
}

fn ignored(store: &TimerStore<Database, SystemClock>, what: &str) -> CliResult {
    eprintln!("{what} ignored in the current state");
    print_json(&store.snapshot())
}

fn report(store: &TimerStore<Database, SystemClock>, event: Option<Event>, what: &str) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => ignored(store, what),
    }
}

fn log_session(
    store: &TimerStore<Database, SystemClock>,
    subject: String,
    topic: String,
    category: SessionCategory,
    notes: String,
    productive: bool,
) -> Result<i64, Box<dyn std::error::Error>> {
    // A Work phase left running past zero counts for its planned length only.
    let timer = store.timer();
    let elapsed_secs = timer.elapsed_secs(store.now_ms()).min(timer.phase_secs());
    let completed_at = Utc::now();
    let started_at = completed_at - chrono::Duration::seconds(elapsed_secs as i64);
    let id = store.storage().record_session(&NewStudySession {
        subject,
        topic,
        duration_min: elapsed_secs / 60,
        category,
        notes,
        productive,
        started_at,
        completed_at,
    })?;
    Ok(id)
}

fn watch(store: &mut TimerStore<Database, SystemClock>) -> CliResult {
    if !store.is_running() {
        eprintln!("timer is not running");
        return print_json(&store.snapshot());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()?;

    let outcome = runtime.block_on(async {
        tokio::select! {
            outcome = ticker::run_until_idle(store, TICK_PERIOD, |event| {
                if let Some(line) = plain_line(event) {
                    println!("{line}");
                }
            }) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    match outcome {
        Some(TickOutcome::WorkCompleted(event)) => {
            print_json(&event)?;
            println!("Work phase finished. Run `studyroom timer complete` to log it and take your break.");
        }
        Some(TickOutcome::BreakEnded(event)) => {
            print_json(&event)?;
            println!("Break's over. Run `studyroom timer start` to focus again.");
        }
        Some(TickOutcome::Idle) | None => {}
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load_or_default();
    let mut store = open_store(&config)?;

    // Every invocation is a fresh observer: report a phase that ended while
    // nobody was watching. Stdout stays a single JSON document.
    if let Some(event) = store.tick() {
        eprintln!("{}", serde_json::to_string(&event)?);
    }

    match action {
        TimerAction::Start => {
            let event = store.start();
            report(&store, event, "start")?;
        }
        TimerAction::Pause => {
            let event = store.pause();
            report(&store, event, "pause")?;
        }
        TimerAction::Reset => {
            let event = store.reset();
            report(&store, event, "reset")?;
        }
        TimerAction::Skip => {
            let event = store.skip();
            report(&store, event, "skip")?;
        }
        TimerAction::Complete {
            unproductive,
            subject,
            topic,
            category,
            notes,
        } => {
            let productive = !unproductive;
            if store.session_kind() != SessionKind::Work {
                return ignored(&store, "complete");
            }
            if let (Some(subject), Some(topic)) = (subject, topic) {
                let id = log_session(&store, subject, topic, category, notes, productive)?;
                eprintln!("study session {id} logged");
            }
            let event = store.complete_work_phase(productive);
            report(&store, event, "complete")?;
        }
        TimerAction::Duration { minutes } => {
            let event = store.set_planned_duration(minutes);
            report(&store, event, "duration change")?;
        }
        TimerAction::Phase { kind } => {
            let event = store.select_phase(kind);
            report(&store, event, "phase change")?;
        }
        TimerAction::Widget { visibility } => {
            let visible = matches!(visibility, Visibility::Show);
            store.set_widget_visible(visible);
            print_json(&store.snapshot())?;
        }
        TimerAction::Status { plain } => {
            let snapshot = store.snapshot();
            match plain_line(&snapshot) {
                Some(line) if plain => println!("{line}"),
                _ => print_json(&snapshot)?,
            }
        }
        TimerAction::Watch => watch(&mut store)?,
    }
    Ok(())
}
