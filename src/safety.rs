//! Emergency watchdog.
//!
//! Armed whenever the feeder turns on, cancelled whenever it turns off.
//! If the hopper has not filled up `emergency_time` after arming, the
//! watchdog fires and the sensor dispatches [`Action::Emergency`].
//!
//! ## Lifecycle
//!
//! ```text
//!  Disarmed ──arm──▶ Armed ──cancel──▶ Disarmed
//!                      │
//!                      └──expiry (≥ timeout)──▶ fire ──▶ Disarmed
//!                                                 └──(repeat)──▶ Armed
//! ```
//!
//! 1. `arm` records `armed_since`, bumps the generation and schedules a
//!    `WatchdogExpiry` through the [`Scheduler`] port. Re-arming while armed
//!    restarts the timer from the new arming time.
//! 2. `cancel` drops the pending expiry. A stale expiry that still reaches
//!    [`EmergencyWatchdog::on_expiry`] carries an old generation and is
//!    ignored.
//! 3. An expiry fires at most once per arming.
//!
//! A disabled watchdog (`enable_emergency = false`) is never armed and so
//! never fires.
//!
//! [`Action::Emergency`]: crate::app::events::Action::Emergency

use core::time::Duration;

use log::{error, info, warn};

use crate::app::ports::Scheduler;
use crate::error::ScheduleError;
use crate::scheduler::{TimerEvent, TimerToken};
use crate::time::Instant;

/// Coarse watchdog phase, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogPhase {
    Disarmed,
    Armed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchdogState {
    pub armed_since: Option<Instant>,
    /// The current arming already fired.
    pub fired: bool,
}

pub struct EmergencyWatchdog {
    timeout: Duration,
    enabled: bool,
    /// Re-arm at the fire time instead of going quiet.
    repeat: bool,
    state: WatchdogState,
    generation: u32,
    pending: Option<TimerToken>,
    fire_count: u32,
}

impl EmergencyWatchdog {
    pub fn new(timeout: Duration, enabled: bool, repeat: bool) -> Self {
        Self {
            timeout,
            enabled,
            repeat,
            state: WatchdogState::default(),
            generation: 0,
            pending: None,
            fire_count: 0,
        }
    }

    /// Arm (or re-arm) at `now`.
    ///
    /// On scheduler refusal the watchdog is left disarmed and the error is
    /// returned so the caller can report it.
    pub fn arm(&mut self, now: Instant, sched: &mut impl Scheduler) -> Result<(), ScheduleError> {
        if !self.enabled {
            return Ok(());
        }
        self.drop_pending(sched);
        self.generation = self.generation.wrapping_add(1);
        self.state = WatchdogState {
            armed_since: Some(now),
            fired: false,
        };

        let event = TimerEvent::WatchdogExpiry {
            generation: self.generation,
        };
        match sched.schedule_after(self.timeout, event) {
            Ok(token) => {
                self.pending = Some(token);
                info!("watchdog armed for {:?}", self.timeout);
                Ok(())
            }
            Err(e) => {
                self.state.armed_since = None;
                Err(e)
            }
        }
    }

    /// Disarm. Returns `true` if a pending expiry was cancelled.
    pub fn cancel(&mut self, sched: &mut impl Scheduler) -> bool {
        let was_armed = self.state.armed_since.take().is_some();
        self.drop_pending(sched);
        if was_armed {
            info!("watchdog cancelled");
        }
        was_armed
    }

    /// Handle an expiry. Returns `true` if the watchdog fired and the
    /// caller must dispatch an emergency.
    pub fn on_expiry(&mut self, generation: u32, now: Instant, sched: &mut impl Scheduler) -> bool {
        if generation != self.generation || self.state.fired {
            return false;
        }
        let Some(since) = self.state.armed_since else {
            return false;
        };
        self.drop_pending(sched);

        let elapsed = now.saturating_duration_since(since);
        if elapsed < self.timeout {
            // Host timer came back early: wait out the remainder.
            let event = TimerEvent::WatchdogExpiry { generation };
            match sched.schedule_after(self.timeout - elapsed, event) {
                Ok(token) => self.pending = Some(token),
                Err(e) => {
                    error!("watchdog lost its expiry: {e}");
                    self.state.armed_since = None;
                }
            }
            return false;
        }

        self.state = WatchdogState {
            armed_since: None,
            fired: true,
        };
        self.fire_count = self.fire_count.wrapping_add(1);
        warn!("watchdog fired after {:?}", elapsed);

        if self.repeat {
            if let Err(e) = self.arm(now, sched) {
                error!("watchdog could not re-arm: {e}");
            }
        }
        true
    }

    pub fn phase(&self) -> WatchdogPhase {
        if self.state.armed_since.is_some() {
            WatchdogPhase::Armed
        } else {
            WatchdogPhase::Disarmed
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.phase() == WatchdogPhase::Armed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emergencies fired since construction.
    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    // ── Internal ──────────────────────────────────────────────────

    fn drop_pending(&mut self, sched: &mut impl Scheduler) {
        if let Some(token) = self.pending.take() {
            sched.cancel(token);
        }
    }
}
