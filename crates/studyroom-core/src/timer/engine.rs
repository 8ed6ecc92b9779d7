//! Study timer state machine.
//!
//! The timer is wall-clock based. It stores *when* the current run started and
//! how many seconds were banked before that, and derives the remaining time
//! from the clock on every observation. Nothing decrements a counter, so time
//! that passes while no view is watching (or while the process is not even
//! alive) is still accounted for.
//!
//! ## Phases
//!
//! ```text
//! Work --complete/skip--> ShortBreak | LongBreak --zero/skip--> Work (idle)
//! ```
//!
//! Each phase is either idle or running. Reaching zero is not a stored state;
//! the caller observes it through [`StudyTimer::tick`].
//!
//! Every command takes the current epoch time in milliseconds and returns
//! `Some(Event)` when it changed something. A command whose precondition does
//! not hold is a no-op returning `None`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{PhaseDurations, SessionKind};
use crate::events::{timestamp, Event};

/// The persisted part of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub session_kind: SessionKind,
    #[serde(default)]
    pub is_running: bool,
    /// Completed Work phases since the last reset.
    #[serde(default)]
    pub cycle_count: u32,
    /// Length of the Work phase. Zero in a stored record means "use the default".
    #[serde(default)]
    pub planned_duration_minutes: u32,
    #[serde(default)]
    pub started_at_epoch_millis: Option<u64>,
    /// Seconds banked in the current phase before the latest start.
    #[serde(default)]
    pub accumulated_seconds: u64,
}

impl TimerState {
    /// Idle Work phase with the default planned length.
    pub fn initial(durations: &PhaseDurations) -> Self {
        Self {
            session_kind: SessionKind::Work,
            is_running: false,
            cycle_count: 0,
            planned_duration_minutes: durations.default_work_min,
            started_at_epoch_millis: None,
            accumulated_seconds: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudyTimer {
    state: TimerState,
    durations: PhaseDurations,
    /// Zero-crossing of the current phase was already reported. Not persisted:
    /// after a reload the finished phase is reported again.
    completion_reported: bool,
}

impl StudyTimer {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            state: TimerState::initial(&durations),
            durations,
            completion_reported: false,
        }
    }

    /// Rebuild a timer from a stored record, repairing anything that breaks
    /// the state invariants.
    pub fn restore(mut state: TimerState, durations: PhaseDurations) -> Self {
        if state.planned_duration_minutes == 0 {
            state.planned_duration_minutes = durations.default_work_min;
        }
        match (state.is_running, state.started_at_epoch_millis) {
            (true, None) => state.is_running = false,
            (false, Some(_)) => state.started_at_epoch_millis = None,
            _ => {}
        }
        let phase_secs = durations.phase_secs(state.session_kind, state.planned_duration_minutes);
        if state.accumulated_seconds >= phase_secs {
            state.accumulated_seconds = 0;
        }
        Self {
            state,
            durations,
            completion_reported: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn durations(&self) -> &PhaseDurations {
        &self.durations
    }

    pub fn session_kind(&self) -> SessionKind {
        self.state.session_kind
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn cycle_count(&self) -> u32 {
        self.state.cycle_count
    }

    pub fn planned_duration_min(&self) -> u32 {
        self.state.planned_duration_minutes
    }

    /// Full length of the current phase in seconds.
    pub fn phase_secs(&self) -> u64 {
        self.durations
            .phase_secs(self.state.session_kind, self.state.planned_duration_minutes)
    }

    /// Whole seconds elapsed in the current run, zero when idle.
    fn live_elapsed_secs(&self, now_ms: u64) -> u64 {
        match (self.state.is_running, self.state.started_at_epoch_millis) {
            (true, Some(started)) => now_ms.saturating_sub(started) / 1000,
            _ => 0,
        }
    }

    /// Seconds elapsed in the current phase, banked plus live.
    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        self.state
            .accumulated_seconds
            .saturating_add(self.live_elapsed_secs(now_ms))
    }

    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.phase_secs().saturating_sub(self.elapsed_secs(now_ms))
    }

    /// Running with nothing left: the phase is waiting to be closed.
    pub fn is_phase_complete(&self, now_ms: u64) -> bool {
        self.state.is_running && self.remaining_secs(now_ms) == 0
    }

    /// The completion of a finished Work phase that is still waiting to be
    /// closed, whether or not [`tick`](Self::tick) already reported it.
    pub fn pending_completion(&self, now_ms: u64) -> Option<Event> {
        if self.state.session_kind.is_break() || !self.is_phase_complete(now_ms) {
            return None;
        }
        Some(self.completion_event(now_ms))
    }

    fn completion_event(&self, now_ms: u64) -> Event {
        Event::PhaseCompleted {
            session_kind: self.state.session_kind,
            cycle_count: self.state.cycle_count,
            at: timestamp(now_ms),
        }
    }

    pub fn snapshot(&self, now_ms: u64, widget_visible: bool) -> Event {
        Event::StateSnapshot {
            session_kind: self.state.session_kind,
            label: self.state.session_kind.label().to_string(),
            is_running: self.state.is_running,
            cycle_count: self.state.cycle_count,
            planned_duration_min: self.state.planned_duration_minutes,
            remaining_secs: self.remaining_secs(now_ms),
            total_secs: self.phase_secs(),
            widget_visible,
            at: timestamp(now_ms),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        let remaining = self.remaining_secs(now_ms);
        if remaining == 0 {
            return None;
        }
        self.state.is_running = true;
        self.state.started_at_epoch_millis = Some(now_ms);
        debug!(kind = %self.state.session_kind, remaining, "timer started");
        Some(Event::TimerStarted {
            session_kind: self.state.session_kind,
            duration_secs: self.phase_secs(),
            remaining_secs: remaining,
            at: timestamp(now_ms),
        })
    }

    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        let elapsed = self.elapsed_secs(now_ms);
        if elapsed >= self.phase_secs() {
            // Finished phases are closed by completion, not frozen.
            return None;
        }
        self.state.accumulated_seconds = elapsed;
        self.state.started_at_epoch_millis = None;
        self.state.is_running = false;
        debug!(kind = %self.state.session_kind, banked = elapsed, "timer paused");
        Some(Event::TimerPaused {
            session_kind: self.state.session_kind,
            remaining_secs: self.remaining_secs(now_ms),
            at: timestamp(now_ms),
        })
    }

    pub fn reset(&mut self, now_ms: u64) -> Option<Event> {
        self.state = TimerState::initial(&self.durations);
        self.completion_reported = false;
        debug!("timer reset");
        Some(Event::TimerReset {
            planned_duration_min: self.state.planned_duration_minutes,
            at: timestamp(now_ms),
        })
    }

    /// Ignored while running so "done" cannot move mid-session.
    pub fn set_planned_duration(&mut self, minutes: u32, now_ms: u64) -> Option<Event> {
        if self.state.is_running || minutes == 0 {
            return None;
        }
        self.state.planned_duration_minutes = minutes;
        self.state.accumulated_seconds = 0;
        self.completion_reported = false;
        Some(Event::PlannedDurationChanged {
            planned_duration_min: minutes,
            at: timestamp(now_ms),
        })
    }

    /// Close the current Work phase and start the break it earned.
    ///
    /// `productive` is carried on the returned event for the caller's own
    /// session log; the timer does not interpret it.
    pub fn complete_work_phase(&mut self, productive: bool, now_ms: u64) -> Option<Event> {
        if self.state.session_kind != SessionKind::Work {
            return None;
        }
        self.state.cycle_count = self.state.cycle_count.saturating_add(1);
        self.state.session_kind = SessionKind::break_after(self.state.cycle_count);
        self.state.accumulated_seconds = 0;
        self.state.is_running = true;
        self.state.started_at_epoch_millis = Some(now_ms);
        self.completion_reported = false;
        debug!(
            cycle = self.state.cycle_count,
            kind = %self.state.session_kind,
            productive,
            "work phase completed"
        );
        Some(Event::BreakStarted {
            session_kind: self.state.session_kind,
            cycle_count: self.state.cycle_count,
            duration_secs: self.phase_secs(),
            productive,
            at: timestamp(now_ms),
        })
    }

    /// End a break early, or give up the current Work phase for its break.
    pub fn skip(&mut self, now_ms: u64) -> Option<Event> {
        match self.state.session_kind {
            SessionKind::Work => self.complete_work_phase(false, now_ms),
            _ => self.end_break(now_ms),
        }
    }

    /// Switch phase by hand while idle.
    pub fn select_phase(&mut self, kind: SessionKind, now_ms: u64) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.session_kind = kind;
        self.state.accumulated_seconds = 0;
        self.completion_reported = false;
        Some(Event::PhaseSelected {
            session_kind: kind,
            at: timestamp(now_ms),
        })
    }

    /// New settings. Break lengths always follow them; the planned Work length
    /// and the banked seconds are only touched while idle.
    pub fn apply_durations(&mut self, durations: PhaseDurations, now_ms: u64) -> Option<Event> {
        self.durations = durations;
        if !self.state.is_running {
            if self.state.session_kind == SessionKind::Work && durations.default_work_min > 0 {
                self.state.planned_duration_minutes = durations.default_work_min;
            }
            self.state.accumulated_seconds = 0;
            self.completion_reported = false;
        }
        Some(Event::DurationsApplied {
            planned_duration_min: self.state.planned_duration_minutes,
            short_break_secs: durations.short_break_secs(),
            long_break_secs: durations.long_break_secs(),
            at: timestamp(now_ms),
        })
    }

    /// Observe the clock. Returns `Some(Event::PhaseCompleted)` the first time
    /// a running phase is seen at zero.
    ///
    /// A finished Work phase stays as it is until the caller closes it with
    /// [`complete_work_phase`](Self::complete_work_phase). A finished break
    /// drops straight back into idle Work.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        if self.remaining_secs(now_ms) > 0 {
            self.completion_reported = false;
            return None;
        }
        if self.completion_reported {
            return None;
        }
        let kind = self.state.session_kind;
        let event = self.completion_event(now_ms);
        debug!(%kind, "phase reached zero");
        if kind.is_break() {
            self.end_break(now_ms);
        } else {
            self.completion_reported = true;
        }
        Some(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn end_break(&mut self, now_ms: u64) -> Option<Event> {
        let from = self.state.session_kind;
        if !from.is_break() {
            return None;
        }
        self.state.session_kind = SessionKind::Work;
        self.state.accumulated_seconds = 0;
        self.state.is_running = false;
        self.state.started_at_epoch_millis = None;
        self.completion_reported = false;
        Some(Event::BreakEnded {
            from,
            at: timestamp(now_ms),
        })
    }
}
