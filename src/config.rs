//! Sensor configuration.
//!
//! [`SensorConfig`] is the raw, deserializable form loaded from the host's
//! configuration file. It is validated exactly once into the immutable
//! [`SensorSettings`] that the sensor pipeline is built from; an invalid
//! document never produces a sensor.

use core::time::Duration;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum sensor-name length (fixed capacity, no heap).
pub const NAME_CAPACITY: usize = 32;

/// Name given to a sensor whose config omits one.
pub const DEFAULT_NAME: &str = "hopper";

const _: () = assert!(DEFAULT_NAME.len() <= NAME_CAPACITY);

/// Raw per-sensor configuration as it appears in the host config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Sensor name used in logs, status, and command replies.
    pub name: String<NAME_CAPACITY>,

    // --- Runout handling ---
    /// Pause the running job when a runout is detected.
    pub pause_on_runout: bool,

    // --- Debounce ---
    /// Stabilisation window in seconds. Takes precedence over the legacy
    /// sample-count form below.
    pub debounce_time: Option<f32>,
    /// Legacy: seconds between debounce samples.
    pub debounce_sample_time: f32,
    /// Legacy: number of consecutive samples required.
    pub debounce_sample_number: u32,

    // --- Emergency watchdog ---
    /// Seconds the feeder may run before the emergency fires.
    pub emergency_time: f32,
    /// Arm the watchdog when the feeder turns on.
    pub enable_emergency: bool,
    /// Keep firing every `emergency_time` while the runout persists.
    pub repeat_emergency: bool,

    // --- Sensor gate ---
    /// Initial enable state of the decision logic.
    pub enabled: bool,

    // --- Scripts ---
    /// Script run when the feeder is turned on (runout).
    pub runout_script: Option<std::string::String>,
    /// Script run when the feeder is turned off (filled up).
    pub filledup_script: Option<std::string::String>,
    /// Script run when the watchdog fires.
    pub emergency_script: Option<std::string::String>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            name: String::try_from(DEFAULT_NAME).unwrap_or_default(),
            pause_on_runout: false,

            debounce_time: None,
            debounce_sample_time: 0.1,
            debounce_sample_number: 10,

            emergency_time: 10.0,
            enable_emergency: true,
            repeat_emergency: false,

            enabled: true,

            runout_script: None,
            filledup_script: None,
            emergency_script: None,
        }
    }
}

impl SensorConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| {
            log::error!("config parse failed: {}", e);
            ConfigError::Malformed
        })
    }

    /// Effective debounce window in seconds.
    pub fn debounce_secs(&self) -> f32 {
        self.debounce_time
            .unwrap_or(self.debounce_sample_time * self.debounce_sample_number as f32)
    }

    /// Validate every field and freeze the result.
    pub fn validate(&self) -> Result<SensorSettings, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::NameLength);
        }
        if self.debounce_time.is_none() {
            if !(self.debounce_sample_time.is_finite() && self.debounce_sample_time > 0.0) {
                return Err(ConfigError::DebounceTimeNotPositive);
            }
            if self.debounce_sample_number == 0 {
                return Err(ConfigError::SampleNumberZero);
            }
        }
        let debounce = self.debounce_secs();
        if !(debounce.is_finite() && debounce > 0.0) {
            return Err(ConfigError::DebounceTimeNotPositive);
        }
        if !(self.emergency_time.is_finite() && self.emergency_time >= 1.0) {
            return Err(ConfigError::EmergencyTimeTooShort);
        }
        for script in [&self.runout_script, &self.filledup_script, &self.emergency_script]
            .into_iter()
            .flatten()
        {
            if script.contains('\0') {
                return Err(ConfigError::Invalid("script contains NUL"));
            }
        }

        let debounce_time = Duration::try_from_secs_f32(debounce)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or(ConfigError::DebounceTimeNotPositive)?;
        let emergency_time = Duration::try_from_secs_f32(self.emergency_time)
            .map_err(|_| ConfigError::Invalid("emergency_time out of range"))?;

        Ok(SensorSettings {
            name: self.name.clone(),
            pause_on_runout: self.pause_on_runout,
            debounce_time,
            emergency_time,
            enable_emergency: self.enable_emergency,
            repeat_emergency: self.repeat_emergency,
            enabled: self.enabled,
        })
    }
}

/// Validated, immutable settings the sensor pipeline is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSettings {
    pub name: String<NAME_CAPACITY>,
    pub pause_on_runout: bool,
    pub debounce_time: Duration,
    pub emergency_time: Duration,
    pub enable_emergency: bool,
    pub repeat_emergency: bool,
    pub enabled: bool,
}

impl Default for SensorSettings {
    fn default() -> Self {
        // The default document is valid by construction.
        let c = SensorConfig::default();
        Self {
            name: c.name,
            pause_on_runout: c.pause_on_runout,
            debounce_time: Duration::from_secs(1),
            emergency_time: Duration::from_secs(10),
            enable_emergency: c.enable_emergency,
            repeat_emergency: c.repeat_emergency,
            enabled: c.enabled,
        }
    }
}
