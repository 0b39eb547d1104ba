//! Unified error types for the hopper-feed controller.
//!
//! A single `Error` enum that every subsystem converts into, so the reactor
//! and the host glue handle failures uniformly. All variants are `Copy`
//! so they can be passed through the sensor pipeline without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid; the sensor cannot be constructed.
    Config(ConfigError),
    /// A timer could not be scheduled.
    Schedule(ScheduleError),
    /// An external action (script, relay) failed.
    Dispatch(DispatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Raised while parsing or validating a [`SensorConfig`](crate::config::SensorConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `debounce_time` (or the legacy sample time) is zero, negative or not finite.
    DebounceTimeNotPositive,
    /// `emergency_time` is below one second or not finite.
    EmergencyTimeTooShort,
    /// Legacy `debounce_sample_number` is zero.
    SampleNumberZero,
    /// Sensor name is empty or longer than the fixed capacity.
    NameLength,
    /// The document could not be deserialized.
    Malformed,
    /// Any other field failed validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebounceTimeNotPositive => write!(f, "debounce_time must be > 0"),
            Self::EmergencyTimeTooShort => write!(f, "emergency_time must be >= 1s"),
            Self::SampleNumberZero => write!(f, "debounce_sample_number must be >= 1"),
            Self::NameLength => write!(f, "sensor name must be 1..=32 characters"),
            Self::Malformed => write!(f, "malformed configuration document"),
            Self::Invalid(msg) => write!(f, "invalid value: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// Every timer slot is occupied.
    QueueFull,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "timer queue full"),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Failures at the action-dispatch boundary. These never reach the state
/// machine; dispatchers log them and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// A `{` placeholder was never closed.
    UnterminatedPlaceholder,
    /// A placeholder named a variable the renderer does not know.
    UnknownPlaceholder,
    /// A lone `}` appeared outside a placeholder.
    UnbalancedBrace,
    /// The host rejected or failed to execute the script.
    ScriptFailed,
    /// The feeder relay pin could not be driven.
    PinWriteFailed,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedPlaceholder => write!(f, "unterminated template placeholder"),
            Self::UnknownPlaceholder => write!(f, "unknown template placeholder"),
            Self::UnbalancedBrace => write!(f, "unbalanced '}}' in template"),
            Self::ScriptFailed => write!(f, "script execution failed"),
            Self::PinWriteFailed => write!(f, "relay pin write failed"),
        }
    }
}

impl From<DispatchError> for Error {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
