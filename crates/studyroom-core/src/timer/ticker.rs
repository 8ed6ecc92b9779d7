//! Periodic observation of a running timer.
//!
//! The ticker never changes time itself; each tick only asks the store to
//! recompute remaining time from the clock and report a zero-crossing. It
//! lives only while the timer runs, and dropping the future stops it.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use super::clock::Clock;
use super::store::TimerStore;
use crate::events::Event;
use crate::storage::KvStore;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Why [`run_until_idle`] returned.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The timer was not running (never started, paused or reset).
    Idle,
    /// A Work phase reached zero; the caller decides how to close it.
    WorkCompleted(Event),
    /// A break reached zero and the timer dropped back into idle Work.
    BreakEnded(Event),
}

/// Tick `store` every `period` while it runs, passing a fresh snapshot and any
/// completion event to `on_event`.
pub async fn run_until_idle<S, C, F>(
    store: &mut TimerStore<S, C>,
    period: Duration,
    mut on_event: F,
) -> TickOutcome
where
    S: KvStore,
    C: Clock,
    F: FnMut(&Event),
{
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while store.is_running() {
        ticks.tick().await;
        // A Work phase already reported to an earlier observer still ends the
        // watch; tick() only emits once per phase.
        let completed = store.tick().or_else(|| store.pending_completion());
        on_event(&store.snapshot());
        if let Some(event) = completed {
            on_event(&event);
            return match &event {
                Event::PhaseCompleted { session_kind, .. } if session_kind.is_break() => {
                    TickOutcome::BreakEnded(event)
                }
                _ => TickOutcome::WorkCompleted(event),
            };
        }
    }
    TickOutcome::Idle
}
