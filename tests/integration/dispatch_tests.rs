//! Dispatcher adapters driven through the reactor: scripts and relay pin.

use std::cell::Cell;

use hopperfeed::adapters::relay::{FeederRelay, RelayState};
use hopperfeed::adapters::script::ScriptDispatcher;
use hopperfeed::adapters::time::ManualClock;
use hopperfeed::app::events::Action;
use hopperfeed::config::SensorConfig;
use hopperfeed::events::SensorId;

use crate::mock_hw::{MockPin, MockScriptRunner, RecordingDispatcher, ms, run_to, single_sensor};

const S0: SensorId = SensorId(0);

fn config(json: &str) -> SensorConfig {
    SensorConfig::from_json(json).unwrap()
}

#[test]
fn scripts_and_relay_follow_runout_cycle() {
    let cfg = config(
        r#"{
            "name": "hopper",
            "runout_script": "M118 {sensor} {action} {eventtime}",
            "filledup_script": "M118 {sensor} full",
            "emergency_script": "M112"
        }"#,
    );
    let scripts = ScriptDispatcher::from_config(&cfg, MockScriptRunner::default()).unwrap();
    let relay = FeederRelay::new(MockPin::default());

    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, cfg.validate().unwrap(), (scripts, relay));

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(1500), 100);
    {
        let (scripts, relay) = r.dispatcher(S0).unwrap();
        assert_eq!(scripts.runner().scripts, vec!["M118 hopper runout 1.000\nM400"]);
        assert!(relay.pin().high);
        assert_eq!(relay.state(), RelayState::On);
    }

    r.push_sample(S0, true, ms(1500));
    run_to(&mut r, &clock, ms(5000), 100);
    let (scripts, relay) = r.dispatcher(S0).unwrap();
    assert_eq!(scripts.runner().scripts.last().unwrap(), "M118 hopper full\nM400");
    assert!(!relay.pin().high);
    assert_eq!(relay.pin().history, vec![false, true, false]);
}

#[test]
fn emergency_trips_relay_and_runs_script() {
    let cfg = config(r#"{ "emergency_script": "M112", "emergency_time": 2.0 }"#);
    let scripts = ScriptDispatcher::from_config(&cfg, MockScriptRunner::default()).unwrap();
    let relay = FeederRelay::new(MockPin::default());

    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, cfg.validate().unwrap(), (scripts, relay));

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(10_000), 100);

    let (scripts, relay) = r.dispatcher(S0).unwrap();
    // No runout script configured: only the emergency runs.
    assert_eq!(scripts.runner().scripts, vec!["M112\nM400"]);
    assert_eq!(relay.state(), RelayState::Tripped);
    assert!(!relay.pin().high);
}

#[test]
fn pause_on_runout_sends_pause() {
    let cfg = config(r#"{ "pause_on_runout": true }"#);
    let scripts = ScriptDispatcher::from_config(&cfg, MockScriptRunner::default()).unwrap();

    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, cfg.validate().unwrap(), scripts);

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(2000), 100);
    assert_eq!(r.dispatcher(S0).unwrap().runner().scripts, vec!["PAUSE\n\nM400"]);
}

#[test]
fn failing_scripts_do_not_disturb_state() {
    let cfg = config(r#"{ "runout_script": "M118 out", "filledup_script": "M118 in" }"#);
    let runner = MockScriptRunner {
        fail: true,
        ..MockScriptRunner::default()
    };
    let scripts = ScriptDispatcher::from_config(&cfg, runner).unwrap();

    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(
        &clock,
        &job,
        cfg.validate().unwrap(),
        (scripts, RecordingDispatcher::default()),
    );

    r.push_sample(S0, false, ms(0));
    r.push_sample(S0, true, ms(1500));
    run_to(&mut r, &clock, ms(20_000), 100);

    let (scripts, recorder) = r.dispatcher(S0).unwrap();
    assert_eq!(scripts.runner().scripts.len(), 2, "each action ran exactly once");
    assert_eq!(recorder.kinds(), vec![Action::TurnOnFeeder, Action::TurnOffFeeder]);
    assert!(!r.status(S0).unwrap().watchdog_armed);
}
