//! The one authoritative timer shared by every view.
//!
//! [`TimerStore`] owns the [`StudyTimer`], the floating-widget flag, the
//! storage it persists to and the clock it reads. Every command that changes
//! something is written through to storage and fanned out to subscribers.
//! Storage failures are logged and ignored: the in-memory timer stays
//! authoritative and the countdown keeps working.

use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::engine::{StudyTimer, TimerState};
use super::phase::{PhaseDurations, SessionKind};
use crate::events::{timestamp, Event};
use crate::storage::KvStore;

/// Storage key of the serialized [`TimerState`].
pub const TIMER_STATE_KEY: &str = "timer_state";
/// Storage key of the floating-widget visibility flag.
pub const WIDGET_VISIBLE_KEY: &str = "timer_widget_visible";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Event)>;

pub struct TimerStore<S, C = SystemClock> {
    timer: StudyTimer,
    widget_visible: bool,
    storage: S,
    clock: C,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: KvStore, C: Clock> TimerStore<S, C> {
    /// Read the persisted timer and widget flag, falling back to a fresh
    /// timer when nothing usable is stored.
    pub fn load(storage: S, clock: C, durations: PhaseDurations) -> Self {
        let timer = match storage.get(TIMER_STATE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<TimerState>(&json) {
                Ok(state) => StudyTimer::restore(state, durations),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable timer state");
                    StudyTimer::new(durations)
                }
            },
            Ok(None) => StudyTimer::new(durations),
            Err(e) => {
                warn!(error = %e, "could not read timer state");
                StudyTimer::new(durations)
            }
        };

        let widget_visible = match storage.get(WIDGET_VISIBLE_KEY) {
            Ok(Some(json)) => serde_json::from_str::<bool>(&json).unwrap_or_else(|e| {
                warn!(error = %e, "discarding unreadable widget flag");
                false
            }),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "could not read widget flag");
                false
            }
        };

        debug!(
            kind = %timer.session_kind(),
            running = timer.is_running(),
            cycles = timer.cycle_count(),
            "timer loaded"
        );

        Self {
            timer,
            widget_visible,
            storage,
            clock,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &StudyTimer {
        &self.timer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn widget_visible(&self) -> bool {
        self.widget_visible
    }

    pub fn session_kind(&self) -> SessionKind {
        self.timer.session_kind()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs(self.clock.now_ms())
    }

    pub fn snapshot(&self) -> Event {
        self.timer.snapshot(self.clock.now_ms(), self.widget_visible)
    }

    pub fn pending_completion(&self) -> Option<Event> {
        self.timer.pending_completion(self.clock.now_ms())
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Call `f` with every event produced from now on.
    pub fn subscribe(&mut self, f: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.timer.start(self.clock.now_ms());
        if event.is_some() {
            self.widget_visible = true;
        }
        self.commit(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.timer.pause(self.clock.now_ms());
        self.commit(event)
    }

    pub fn reset(&mut self) -> Option<Event> {
        let event = self.timer.reset(self.clock.now_ms());
        self.widget_visible = false;
        self.commit(event)
    }

    pub fn set_planned_duration(&mut self, minutes: u32) -> Option<Event> {
        let event = self.timer.set_planned_duration(minutes, self.clock.now_ms());
        self.commit(event)
    }

    pub fn complete_work_phase(&mut self, productive: bool) -> Option<Event> {
        let event = self.timer.complete_work_phase(productive, self.clock.now_ms());
        if event.is_some() {
            self.widget_visible = true;
        }
        self.commit(event)
    }

    pub fn skip(&mut self) -> Option<Event> {
        let was_break = self.timer.session_kind().is_break();
        let event = self.timer.skip(self.clock.now_ms());
        if event.is_some() {
            // Ending a break hides the widget until Work is started again.
            self.widget_visible = !was_break;
        }
        self.commit(event)
    }

    pub fn select_phase(&mut self, kind: SessionKind) -> Option<Event> {
        let event = self.timer.select_phase(kind, self.clock.now_ms());
        self.commit(event)
    }

    pub fn apply_durations(&mut self, durations: PhaseDurations) -> Option<Event> {
        let event = self.timer.apply_durations(durations, self.clock.now_ms());
        self.commit(event)
    }

    pub fn set_widget_visible(&mut self, visible: bool) -> Option<Event> {
        if self.widget_visible == visible {
            return None;
        }
        self.widget_visible = visible;
        let event = Event::WidgetVisibilityChanged {
            visible,
            at: timestamp(self.clock.now_ms()),
        };
        self.commit(Some(event))
    }

    /// Observe the clock; see [`StudyTimer::tick`].
    pub fn tick(&mut self) -> Option<Event> {
        let event = self.timer.tick(self.clock.now_ms());
        self.commit(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn commit(&mut self, event: Option<Event>) -> Option<Event> {
        let event = event?;
        self.persist();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
        Some(event)
    }

    fn persist(&self) {
        match serde_json::to_string(self.timer.state()) {
            Ok(json) => {
                if let Err(e) = self.storage.set(TIMER_STATE_KEY, &json) {
                    warn!(error = %e, "failed to persist timer state");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize timer state"),
        }
        let visible = if self.widget_visible { "true" } else { "false" };
        if let Err(e) = self.storage.set(WIDGET_VISIBLE_KEY, visible) {
            warn!(error = %e, "failed to persist widget flag");
        }
    }
}
