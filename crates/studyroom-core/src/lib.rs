//! # Studyroom Core Library
//!
//! Core logic of the Studyroom exam-preparation planner: a Pomodoro study
//! timer that keeps its state across views and restarts, plus the session log
//! and settings around it. The `studyroom` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a wall-clock state machine ([`StudyTimer`]) owned by a
//!   [`TimerStore`] that persists every change and notifies subscribers.
//!   Remaining time is always derived from absolute timestamps.
//! - **Ticker**: an async loop that observes the store once a second while
//!   the timer runs
//! - **Storage**: SQLite session log and kv records, TOML configuration
//!
//! ## Key Components
//!
//! - [`StudyTimer`]: Core timer state machine
//! - [`TimerStore`]: Shared, persisted timer with subscriptions
//! - [`Database`]: Session log, statistics and kv storage
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use storage::{
    Config, DailyProgress, Database, KvStore, MemoryStore, NewStudySession, SessionCategory, Stats,
    StudySession,
};
pub use timer::{
    Clock, ManualClock, PhaseDurations, SessionKind, StudyTimer, SystemClock, TimerState,
    TimerStore,
};
