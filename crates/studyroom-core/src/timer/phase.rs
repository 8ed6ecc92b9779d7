use serde::{Deserialize, Serialize};
use std::fmt;

/// Every 4th completed Work phase earns a long break.
pub const CYCLES_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn is_break(self) -> bool {
        !matches!(self, SessionKind::Work)
    }

    /// Break earned by the Work phase that brought the count to `cycle_count`.
    pub fn break_after(cycle_count: u32) -> Self {
        if cycle_count % CYCLES_PER_LONG_BREAK == 0 {
            SessionKind::LongBreak
        } else {
            SessionKind::ShortBreak
        }
    }

    /// Short label shown by the floating widget.
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Work => "Focus",
            SessionKind::ShortBreak | SessionKind::LongBreak => "Break",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short-break",
            SessionKind::LongBreak => "long-break",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "focus" => Ok(SessionKind::Work),
            "short-break" | "shortBreak" | "short" => Ok(SessionKind::ShortBreak),
            "long-break" | "longBreak" | "long" => Ok(SessionKind::LongBreak),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}

/// Phase lengths supplied by the settings.
///
/// Work length here is only the *default*; the timer keeps its own
/// user-adjustable planned duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub default_work_min: u32,
    pub short_break_min: u32,
    pub long_break_min: u32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            default_work_min: 25,
            short_break_min: 5,
            long_break_min: 15,
        }
    }
}

impl PhaseDurations {
    pub fn short_break_secs(&self) -> u64 {
        minutes_to_secs(self.short_break_min)
    }

    pub fn long_break_secs(&self) -> u64 {
        minutes_to_secs(self.long_break_min)
    }

    /// Length of `kind` in seconds, given the planned Work length.
    pub fn phase_secs(&self, kind: SessionKind, planned_work_min: u32) -> u64 {
        match kind {
            SessionKind::Work => minutes_to_secs(planned_work_min),
            SessionKind::ShortBreak => self.short_break_secs(),
            SessionKind::LongBreak => self.long_break_secs(),
        }
    }
}

pub(crate) fn minutes_to_secs(min: u32) -> u64 {
    (min as u64).saturating_mul(60)
}

/// `MM:SS`, minutes not wrapped at the hour.
pub fn format_remaining(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
