//! Application service — the hexagonal core.
//!
//! [`RunoutSensor`] owns the debouncer, the presence state machine and the
//! emergency watchdog for one configured sensor. It exposes a
//! host-agnostic API; time, timers, job state and actions all flow through
//! port traits injected at call sites, so the whole pipeline runs under
//! mock adapters in tests.
//!
//! ```text
//!  RawSample ──▶ ┌──────────────────────────────┐ ──▶ ActionDispatcher
//!                │         RunoutSensor          │
//!  TimerEvent ─▶ │ Debouncer · Machine · Watchdog│ ◀─▶ Scheduler
//!                └──────────────────────────────┘ ◀── JobActivity
//! ```
//!
//! Every method commits internal state before it calls the dispatcher.

use log::{info, warn};

use crate::config::{SensorConfig, SensorSettings};
use crate::error::ConfigError;
use crate::fsm::{Decision, PresenceState, PresenceStateMachine};
use crate::safety::EmergencyWatchdog;
use crate::scheduler::TimerEvent;
use crate::sensors::debounce::Debouncer;
use crate::sensors::{RawSample, StablePresence};
use crate::time::Instant;

use super::commands::{CommandReply, SensorCommand};
use super::events::{Action, SensorStatus};
use super::ports::{ActionDispatcher, JobActivity, Scheduler};

// ───────────────────────────────────────────────────────────────
// RunoutSensor
// ───────────────────────────────────────────────────────────────

/// One hopper presence sensor and the feeder it controls.
pub struct RunoutSensor {
    settings: SensorSettings,
    debouncer: Debouncer,
    machine: PresenceStateMachine,
    watchdog: EmergencyWatchdog,
}

impl RunoutSensor {
    pub fn new(settings: SensorSettings) -> Self {
        let debouncer = Debouncer::new(settings.debounce_time);
        let machine = PresenceStateMachine::new(settings.enabled);
        let watchdog = EmergencyWatchdog::new(
            settings.emergency_time,
            settings.enable_emergency,
            settings.repeat_emergency,
        );
        info!(
            "sensor '{}' ready: debounce {:?}, emergency {:?} ({})",
            settings.name,
            settings.debounce_time,
            settings.emergency_time,
            if settings.enable_emergency { "on" } else { "off" },
        );
        Self {
            settings,
            debouncer,
            machine,
            watchdog,
        }
    }

    /// Validate `config` and build the sensor from it.
    pub fn from_config(config: &SensorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.validate()?))
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Feed one raw sample. Samples are always debounced, even while the
    /// sensor is disabled, so re-enabling can act on a fresh value.
    ///
    /// A full timer queue drops the sample; the sensor stays live and the
    /// next sample retries.
    pub fn on_sample(&mut self, sample: RawSample, sched: &mut impl Scheduler) {
        if let Err(e) = self.debouncer.on_sample(sample, sched) {
            warn!("sensor '{}': sample dropped: {e}", self.settings.name);
        }
    }

    /// Route a timer expiry scheduled by this sensor.
    pub fn on_timer(
        &mut self,
        event: TimerEvent,
        now: Instant,
        job: &impl JobActivity,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) {
        match event {
            TimerEvent::DebounceRecheck { generation } => {
                if let Some(stable) = self.debouncer.on_recheck(generation, now) {
                    self.on_stable(stable, now, job.is_job_active(), sched, dispatcher);
                }
            }
            TimerEvent::WatchdogExpiry { generation } => {
                if self.watchdog.on_expiry(generation, now, sched) {
                    warn!(
                        "sensor '{}': feeder ran {:?} without filling up",
                        self.settings.name, self.settings.emergency_time
                    );
                    dispatcher.dispatch(Action::Emergency, now);
                }
            }
        }
    }

    /// Re-evaluate after the host's job state changed.
    pub fn on_job_activity_changed(
        &mut self,
        job_active: bool,
        now: Instant,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) {
        let decision = self.machine.on_job_activity(job_active);
        self.apply(decision, now, sched, dispatcher);
    }

    /// Enable or disable the decision logic.
    ///
    /// Enabling re-evaluates the latest debounced value immediately.
    /// Disabling switches a running feeder off and cancels the watchdog.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        now: Instant,
        job: &impl JobActivity,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) {
        let decision = if enabled {
            self.machine.enable(self.debouncer.stable(), job.is_job_active())
        } else {
            let d = self.machine.disable();
            self.watchdog.cancel(sched);
            d
        };
        self.apply(decision, now, sched, dispatcher);
    }

    /// Interpret a console command.
    pub fn handle_command(
        &mut self,
        cmd: SensorCommand,
        now: Instant,
        job: &impl JobActivity,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) -> CommandReply {
        match cmd {
            SensorCommand::Query => CommandReply::Presence {
                name: self.settings.name.as_str().into(),
                detected: self.filament_detected(),
            },
            SensorCommand::SetEnabled(enabled) => {
                self.set_enabled(enabled, now, job, sched, dispatcher);
                CommandReply::Enabled {
                    name: self.settings.name.as_str().into(),
                    enabled: self.machine.is_enabled(),
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Debounced presence; `false` until the first value is confirmed.
    pub fn filament_detected(&self) -> bool {
        self.debouncer.stable().is_some_and(|s| s.present)
    }

    pub fn presence_state(&self) -> PresenceState {
        self.machine.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.machine.is_enabled()
    }

    pub fn feeder_on(&self) -> bool {
        self.machine.feeder_on()
    }

    pub fn watchdog_armed(&self) -> bool {
        self.watchdog.is_armed()
    }

    pub fn status(&self) -> SensorStatus {
        SensorStatus {
            name: self.settings.name.clone(),
            filament_detected: self.filament_detected(),
            enabled: self.machine.is_enabled(),
            feeder_on: self.machine.feeder_on(),
            watchdog_armed: self.watchdog.is_armed(),
            emergency_count: self.watchdog.fire_count(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_stable(
        &mut self,
        stable: StablePresence,
        now: Instant,
        job_active: bool,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) {
        info!(
            "sensor '{}': presence confirmed {} (job {})",
            self.settings.name,
            stable.present,
            if job_active { "active" } else { "idle" },
        );
        let decision = self.machine.on_stable(stable, job_active);
        self.apply(decision, now, sched, dispatcher);
    }

    /// Commit the watchdog side of `decision`, then dispatch it.
    fn apply(
        &mut self,
        decision: Decision,
        now: Instant,
        sched: &mut impl Scheduler,
        dispatcher: &mut impl ActionDispatcher,
    ) {
        let action = match decision {
            Decision::NoOp => return,
            Decision::TurnOnFeeder => {
                if let Err(e) = self.watchdog.arm(now, sched) {
                    warn!("sensor '{}': watchdog not armed: {e}", self.settings.name);
                }
                Action::TurnOnFeeder
            }
            Decision::TurnOffFeeder => {
                self.watchdog.cancel(sched);
                Action::TurnOffFeeder
            }
        };
        info!("sensor '{}': {}", self.settings.name, action);
        dispatcher.dispatch(action, now);
    }
}
