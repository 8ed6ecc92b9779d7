use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionKind;

/// Every state change of the timer produces an Event.
/// Views subscribe to them through the store; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_kind: SessionKind,
        duration_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_kind: SessionKind,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        planned_duration_min: u32,
        at: DateTime<Utc>,
    },
    PlannedDurationChanged {
        planned_duration_min: u32,
        at: DateTime<Utc>,
    },
    PhaseSelected {
        session_kind: SessionKind,
        at: DateTime<Utc>,
    },
    /// Remaining time of the current phase reached zero.
    /// Reported once per phase to whichever view is observing.
    PhaseCompleted {
        session_kind: SessionKind,
        cycle_count: u32,
        at: DateTime<Utc>,
    },
    /// A Work phase was closed and its earned break started.
    BreakStarted {
        session_kind: SessionKind,
        cycle_count: u32,
        duration_secs: u64,
        productive: bool,
        at: DateTime<Utc>,
    },
    /// A break ended, early or on time, and Work is waiting to be started.
    BreakEnded {
        from: SessionKind,
        at: DateTime<Utc>,
    },
    DurationsApplied {
        planned_duration_min: u32,
        short_break_secs: u64,
        long_break_secs: u64,
        at: DateTime<Utc>,
    },
    WidgetVisibilityChanged {
        visible: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_kind: SessionKind,
        label: String,
        is_running: bool,
        cycle_count: u32,
        planned_duration_min: u32,
        remaining_secs: u64,
        total_secs: u64,
        widget_visible: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PlannedDurationChanged { at, .. }
            | Event::PhaseSelected { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::BreakStarted { at, .. }
            | Event::BreakEnded { at, .. }
            | Event::DurationsApplied { at, .. }
            | Event::WidgetVisibilityChanged { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

/// Epoch milliseconds as a UTC timestamp.
pub fn timestamp(epoch_ms: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(epoch_ms as i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::PhaseCompleted {
            session_kind: SessionKind::Work,
            cycle_count: 0,
            at: timestamp(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PhaseCompleted");
        assert_eq!(json["session_kind"], "work");
    }

    #[test]
    fn timestamp_converts_epoch_millis() {
        assert_eq!(timestamp(1_500).timestamp_millis(), 1_500);
    }
}
