//! Fuzz target: `SensorConfig::from_json` and template parsing.
//!
//! Arbitrary text must either be rejected cleanly or produce settings that
//! satisfy every validation bound.
//!
//! cargo fuzz run fuzz_config

#![no_main]

use core::time::Duration;

use hopperfeed::adapters::script::Template;
use hopperfeed::config::SensorConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let _ = Template::parse(text);

    let Ok(config) = SensorConfig::from_json(text) else {
        return;
    };
    if let Ok(settings) = config.validate() {
        assert!(settings.debounce_time > Duration::ZERO);
        assert!(settings.emergency_time >= Duration::from_secs(1));
        assert!(!settings.name.is_empty());
    }
});
