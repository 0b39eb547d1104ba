//! Fuzz target: `Reactor` fed with arbitrary sample streams.
//!
//! Each input byte is one event: the low bit is the raw presence value,
//! bit 1 toggles job activity, bit 2 toggles the sensor enable, and the
//! high five bits are the gap (×50 ms) before it. The reactor must never
//! panic, and feeder actions must strictly alternate.
//!
//! cargo fuzz run fuzz_sample_stream

#![no_main]

use std::cell::Cell;

use core::time::Duration;

use hopperfeed::adapters::time::ManualClock;
use hopperfeed::app::commands::SensorCommand;
use hopperfeed::app::events::Action;
use hopperfeed::app::ports::{ActionDispatcher, Clock};
use hopperfeed::app::service::RunoutSensor;
use hopperfeed::config::SensorSettings;
use hopperfeed::events::SensorId;
use hopperfeed::reactor::Reactor;
use hopperfeed::time::Instant;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Last(Option<Action>);

impl ActionDispatcher for Last {
    fn dispatch(&mut self, action: Action, _at: Instant) {
        if action != Action::Emergency {
            assert_ne!(self.0, Some(action), "duplicate feeder action");
            self.0 = Some(action);
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = Reactor::new(&clock, || job.get());
    let settings = SensorSettings {
        repeat_emergency: data.first().is_some_and(|b| b & 0x80 != 0),
        ..SensorSettings::default()
    };
    let id = r.add_sensor(RunoutSensor::new(settings), Last::default()).unwrap();
    let mut enabled = true;

    for &b in data {
        clock.advance(Duration::from_millis(u64::from(b >> 3) * 50));
        if b & 0b010 != 0 {
            job.set(!job.get());
        }
        if b & 0b100 != 0 {
            enabled = !enabled;
            r.command(id, SensorCommand::SetEnabled(enabled));
        }
        r.push_sample(id, b & 1 != 0, clock.now());
        r.poll();
    }
    clock.advance(Duration::from_secs(60));
    r.poll();

    let status = r.status(id).unwrap();
    assert!(!status.watchdog_armed || status.feeder_on);
});
