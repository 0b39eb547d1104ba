//! Outbound actions and status.
//!
//! The [`RunoutSensor`](super::service::RunoutSensor) hands [`Action`]s to
//! the [`ActionDispatcher`](super::ports::ActionDispatcher) port. Adapters on
//! the other side decide what each one means for the host.

use core::fmt;

use heapless::String;
use serde::Serialize;

use crate::config::NAME_CAPACITY;

/// Externally visible effects requested by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Runout confirmed during a job: start feeding.
    TurnOnFeeder,
    /// Filled up, job idle, or sensor disabled: stop feeding.
    TurnOffFeeder,
    /// The feeder has run for `emergency_time` without the hopper filling.
    Emergency,
}

impl Action {
    /// Short lowercase tag used in templates and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnOnFeeder => "runout",
            Self::TurnOffFeeder => "filledup",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time status of one sensor, for the host's status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub name: String<NAME_CAPACITY>,
    /// Debounced presence; `false` until the first value is confirmed.
    pub filament_detected: bool,
    pub enabled: bool,
    pub feeder_on: bool,
    pub watchdog_armed: bool,
    /// Emergencies fired since construction.
    pub emergency_count: u32,
}
