mod clock;
mod engine;
mod phase;
mod store;
pub mod ticker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{StudyTimer, TimerState};
pub use phase::{format_remaining, PhaseDurations, SessionKind, CYCLES_PER_LONG_BREAK};
pub use store::{SubscriptionId, TimerStore, TIMER_STATE_KEY, WIDGET_VISIBLE_KEY};
