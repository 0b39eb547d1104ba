//! Port traits — the hexagonal boundary between the runout core and the host.
//!
//! ```text
//!   Host adapter ──▶ Port trait ──▶ RunoutSensor (domain)
//! ```
//!
//! Driven adapters (clock, timer queue, job-state query, action executors)
//! implement these traits. The [`RunoutSensor`](super::service::RunoutSensor)
//! consumes them via generics, so the core never touches the host directly.

use core::time::Duration;

use crate::error::{DispatchError, ScheduleError};
use crate::scheduler::{TimerEvent, TimerToken};
use crate::time::Instant;

use super::events::Action;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler
// ───────────────────────────────────────────────────────────────

/// Deferred-callback contract used for debounce rechecks and watchdog
/// expiries.
///
/// Delays are measured from the time of the event being processed, not
/// from whenever the host gets around to calling in. Cancelling an unknown
/// or already-fired token must be a no-op.
pub trait Scheduler {
    fn schedule_after(
        &mut self,
        delay: Duration,
        event: TimerEvent,
    ) -> Result<TimerToken, ScheduleError>;

    fn cancel(&mut self, token: TimerToken);
}

// ───────────────────────────────────────────────────────────────
// Job activity
// ───────────────────────────────────────────────────────────────

/// Whether the host machine is currently executing a job. Polled at
/// decision time; there are no push notifications.
pub trait JobActivity {
    fn is_job_active(&self) -> bool;
}

impl<F: Fn() -> bool> JobActivity for F {
    fn is_job_active(&self) -> bool {
        self()
    }
}

// ───────────────────────────────────────────────────────────────
// Action dispatcher
// ───────────────────────────────────────────────────────────────

/// Receives committed actions and performs the externally visible effect.
///
/// Fire-and-forget: implementations handle (log) their own failures. By the
/// time `dispatch` runs, the sensor's bookkeeping is already committed.
pub trait ActionDispatcher {
    fn dispatch(&mut self, action: Action, at: Instant);
}

impl<D: ActionDispatcher + ?Sized> ActionDispatcher for &mut D {
    fn dispatch(&mut self, action: Action, at: Instant) {
        (**self).dispatch(action, at);
    }
}

/// Fan out to two dispatchers, in order.
impl<A: ActionDispatcher, B: ActionDispatcher> ActionDispatcher for (A, B) {
    fn dispatch(&mut self, action: Action, at: Instant) {
        self.0.dispatch(action, at);
        self.1.dispatch(action, at);
    }
}

// ───────────────────────────────────────────────────────────────
// Script runner
// ───────────────────────────────────────────────────────────────

/// The host's script (G-code) executor.
pub trait ScriptRunner {
    /// Execute a fully rendered script.
    fn run_script(&mut self, script: &str) -> Result<(), DispatchError>;
}

impl<R: ScriptRunner + ?Sized> ScriptRunner for &mut R {
    fn run_script(&mut self, script: &str) -> Result<(), DispatchError> {
        (**self).run_script(script)
    }
}
