//! Presence state machine — decides when the feeder turns on or off.
//!
//! ```text
//!            ┌──────────[job idle, any value]──────────┐
//!            │                                         ▼
//!  UNKNOWN ──┤                ┌────[present]────▶ FILLED (last = off)
//!            │                │                        │
//!            └──[job active]──┤                  [absent, job active]
//!                             │                        ▼
//!                             └────[absent]─────▶ EMPTY (last = on)
//!
//!  EMPTY ──[present, or job idle, or sensor disabled]──▶ FILLED
//! ```
//!
//! The machine only ever reports a transition once: re-delivering the
//! value that produced the current `last_action` yields
//! [`Decision::NoOp`]. All bookkeeping is committed before the caller
//! gets the decision back, so whatever the dispatcher does afterwards
//! cannot desynchronise it.

use log::{debug, info};

use crate::sensors::StablePresence;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Feeder command last committed by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederCommand {
    On,
    Off,
}

/// Observable state, derived from `last_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// Nothing has been decided yet.
    Unknown,
    /// Feeder off.
    Filled,
    /// Feeder on, compensating a runout.
    Empty,
}

/// Output of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    TurnOnFeeder,
    TurnOffFeeder,
    NoOp,
}

/// Per-sensor decision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorState {
    /// `None` until the first value is confirmed while enabled.
    pub current_presence: Option<StablePresence>,
    pub enabled: bool,
    pub last_action: Option<FeederCommand>,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct PresenceStateMachine {
    state: SensorState,
}

impl PresenceStateMachine {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: SensorState {
                current_presence: None,
                enabled,
                last_action: None,
            },
        }
    }

    /// Evaluate a freshly committed presence value.
    ///
    /// Ignored entirely while disabled.
    pub fn on_stable(&mut self, presence: StablePresence, job_active: bool) -> Decision {
        if !self.state.enabled {
            debug!("presence {} ignored: sensor disabled", presence.present);
            return Decision::NoOp;
        }
        self.state.current_presence = Some(presence);
        self.decide(job_active)
    }

    /// Re-evaluate the current value after the job state changed.
    pub fn on_job_activity(&mut self, job_active: bool) -> Decision {
        if !self.state.enabled {
            return Decision::NoOp;
        }
        self.decide(job_active)
    }

    /// Enable the decision logic and immediately evaluate `latest`, the
    /// most recent value the debouncer committed (possibly while we were
    /// disabled).
    pub fn enable(&mut self, latest: Option<StablePresence>, job_active: bool) -> Decision {
        if self.state.enabled {
            return Decision::NoOp;
        }
        self.state.enabled = true;
        info!("sensor enabled");
        if latest.is_some() {
            self.state.current_presence = latest;
        }
        self.decide(job_active)
    }

    /// Disable the decision logic. A running feeder is switched off as
    /// part of disabling; after that the machine is inert.
    pub fn disable(&mut self) -> Decision {
        if !self.state.enabled {
            return Decision::NoOp;
        }
        let decision = if self.state.last_action == Some(FeederCommand::On) {
            self.commit(FeederCommand::Off)
        } else {
            Decision::NoOp
        };
        self.state.enabled = false;
        info!("sensor disabled");
        decision
    }

    pub fn state(&self) -> PresenceState {
        match self.state.last_action {
            None => PresenceState::Unknown,
            Some(FeederCommand::Off) => PresenceState::Filled,
            Some(FeederCommand::On) => PresenceState::Empty,
        }
    }

    pub fn sensor_state(&self) -> &SensorState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn feeder_on(&self) -> bool {
        self.state.last_action == Some(FeederCommand::On)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn decide(&mut self, job_active: bool) -> Decision {
        let Some(presence) = self.state.current_presence else {
            return Decision::NoOp;
        };

        // Nothing consumes material while idle: the feeder stays off
        // regardless of what the sensor reads.
        if !job_active {
            return self.commit(FeederCommand::Off);
        }

        if presence.present {
            self.commit(FeederCommand::Off)
        } else {
            self.commit(FeederCommand::On)
        }
    }

    fn commit(&mut self, command: FeederCommand) -> Decision {
        if self.state.last_action == Some(command) {
            return Decision::NoOp;
        }
        let from = self.state();
        self.state.last_action = Some(command);
        info!("presence transition: {:?} -> {:?}", from, self.state());
        match command {
            FeederCommand::On => Decision::TurnOnFeeder,
            FeederCommand::Off => Decision::TurnOffFeeder,
        }
    }
}
