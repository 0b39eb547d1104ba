//! Inbound commands for a single sensor.
//!
//! These are the host's console verbs (`QUERY_…_SENSOR`,
//! `SET_…_SENSOR ENABLE=`) once the host has parsed them. The
//! [`RunoutSensor`](super::service::RunoutSensor) interprets them and
//! answers with a [`CommandReply`].

use core::fmt;

/// Commands that the host console can send to a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Report the debounced presence.
    Query,
    /// Enable or disable the decision logic.
    SetEnabled(bool),
}

/// Reply to a [`SensorCommand`], rendered for the host console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// Answer to [`SensorCommand::Query`].
    Presence { name: String, detected: bool },
    /// Acknowledges [`SensorCommand::SetEnabled`] with the resulting state.
    Enabled { name: String, enabled: bool },
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence { name, detected: true } => {
                write!(f, "Pellet Sensor {name}: pellet detected")
            }
            Self::Presence { name, detected: false } => {
                write!(f, "Pellet Sensor {name}: pellet not detected")
            }
            Self::Enabled { name, enabled } => {
                let word = if *enabled { "enabled" } else { "disabled" };
                write!(f, "Pellet Sensor {name}: {word}")
            }
        }
    }
}
