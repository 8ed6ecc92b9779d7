//! SQLite-based study-session log and statistics.
//!
//! Provides persistent storage for:
//! - Logged study sessions (one per closed Work phase)
//! - Session statistics (daily and all-time)
//! - Key-value store for the timer snapshot

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::kv::KvStore;
use crate::error::{DatabaseError, Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCategory {
    #[default]
    Study,
    Revision,
    Practice,
}

impl SessionCategory {
    fn as_str(self) -> &'static str {
        match self {
            SessionCategory::Study => "study",
            SessionCategory::Revision => "revision",
            SessionCategory::Practice => "practice",
        }
    }
}

impl std::str::FromStr for SessionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(SessionCategory::Study),
            "revision" => Ok(SessionCategory::Revision),
            "practice" => Ok(SessionCategory::Practice),
            other => Err(format!("unknown session category: {other}")),
        }
    }
}

/// A session about to be logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudySession {
    pub subject: String,
    pub topic: String,
    pub duration_min: u64,
    pub category: SessionCategory,
    pub notes: String,
    pub productive: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl NewStudySession {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "subject".into(),
                message: "must not be empty".into(),
            });
        }
        if self.topic.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "topic".into(),
                message: "must not be empty".into(),
            });
        }
        if self.completed_at < self.started_at {
            return Err(ValidationError::InvalidTimeRange {
                start: self.started_at,
                end: self.completed_at,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub subject: String,
    pub topic: String,
    pub duration_min: u64,
    pub category: SessionCategory,
    pub notes: String,
    pub productive: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Session counts over a window: everything for [`Database::stats_all`],
/// the current UTC day for [`Database::stats_today`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    /// Sessions logged in the window.
    pub total_sessions: u64,
    /// Minutes logged in the window.
    pub total_study_min: u64,
    /// Sessions in the window marked productive.
    pub productive_sessions: u64,
    pub today_sessions: u64,
    pub today_study_min: u64,
}

/// Today's study time against the daily goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyProgress {
    pub studied_min: u64,
    pub goal_min: u64,
    pub percent: f64,
}

impl DailyProgress {
    pub fn new(studied_min: u64, goal_hours: u32) -> Self {
        let goal_min = (goal_hours as u64).saturating_mul(60);
        let percent = if goal_min == 0 {
            0.0
        } else {
            (studied_min as f64 / goal_min as f64 * 100.0).min(100.0)
        };
        Self {
            studied_min,
            goal_min,
            percent,
        }
    }
}

/// SQLite database for the session log and the timer's kv records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/studyroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let dir = data_dir()?;
        Self::open_at(&dir.join("studyroom.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS study_sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                subject      TEXT NOT NULL,
                topic        TEXT NOT NULL,
                duration_min INTEGER NOT NULL,
                category     TEXT NOT NULL DEFAULT 'study',
                notes        TEXT NOT NULL DEFAULT '',
                productive   INTEGER NOT NULL DEFAULT 1,
                started_at   TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_study_sessions_completed_at ON study_sessions(completed_at);",
        )?;
        Ok(())
    }

    /// Log a study session. Returns the new row id.
    pub fn record_session(&self, session: &NewStudySession) -> Result<i64> {
        session.validate()?;
        self.conn.execute(
            "INSERT INTO study_sessions
                (subject, topic, duration_min, category, notes, productive, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.subject.trim(),
                session.topic.trim(),
                session.duration_min,
                session.category.as_str(),
                session.notes,
                session.productive,
                session.started_at.to_rfc3339(),
                session.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject, topic, duration_min, category, notes, productive, started_at, completed_at
             FROM study_sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, subject, topic, duration_min, category, notes, productive, started, completed) =
                row?;
            sessions.push(StudySession {
                id,
                subject,
                topic,
                duration_min,
                category: category.parse().unwrap_or_default(),
                notes,
                productive,
                started_at: parse_time(&started)?,
                completed_at: parse_time(&completed)?,
            });
        }
        Ok(sessions)
    }

    /// Stats for the current UTC day. The window totals equal the `today_*`
    /// fields here.
    pub fn stats_today(&self) -> Result<Stats> {
        let (count, minutes) = self.today_totals()?;
        Ok(Stats {
            total_sessions: count,
            total_study_min: minutes,
            productive_sessions: self.productive_since(Some(today_start().as_str()))?,
            today_sessions: count,
            today_study_min: minutes,
        })
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let (count, minutes) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0) FROM study_sessions",
            [],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        let (today_sessions, today_study_min) = self.today_totals()?;
        Ok(Stats {
            total_sessions: count,
            total_study_min: minutes,
            productive_sessions: self.productive_since(None)?,
            today_sessions,
            today_study_min,
        })
    }

    fn today_totals(&self) -> Result<(u64, u64)> {
        let totals = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_min), 0)
             FROM study_sessions
             WHERE completed_at >= ?1",
            params![today_start()],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        Ok(totals)
    }

    fn productive_since(&self, since: Option<&str>) -> Result<u64> {
        let since = since.unwrap_or("");
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM study_sessions WHERE productive = 1 AND completed_at >= ?1",
            params![since],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(count)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }
}

fn today_start() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")).into())
}
