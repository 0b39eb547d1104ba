//! End-to-end scenarios: raw samples in, feeder actions out.

use std::cell::Cell;

use core::time::Duration;

use hopperfeed::adapters::time::ManualClock;
use hopperfeed::app::commands::SensorCommand;
use hopperfeed::app::events::Action;
use hopperfeed::app::service::RunoutSensor;
use hopperfeed::config::{SensorConfig, SensorSettings};
use hopperfeed::events::SensorId;
use hopperfeed::reactor::Reactor;

use crate::mock_hw::{RecordingDispatcher, ms, run_to, single_sensor};

const S0: SensorId = SensorId(0);

// ── Reference scenarios ───────────────────────────────────────

#[test]
fn runout_then_refill_without_emergency() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    r.push_sample(S0, true, ms(1200));
    run_to(&mut r, &clock, ms(30_000), 100);

    let out = r.dispatcher(S0).unwrap();
    assert_eq!(out.actions, vec![
        (Action::TurnOnFeeder, ms(1000)),
        (Action::TurnOffFeeder, ms(2200)),
    ]);
    assert_eq!(out.count(Action::Emergency), 0);
}

#[test]
fn unresolved_runout_escalates_exactly_once() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(120_000), 250);

    let out = r.dispatcher(S0).unwrap();
    assert_eq!(out.actions, vec![
        (Action::TurnOnFeeder, ms(1000)),
        (Action::Emergency, ms(11_000)),
    ]);
    let status = r.status(S0).unwrap();
    assert!(status.feeder_on);
    assert!(!status.watchdog_armed);
    assert_eq!(status.emergency_count, 1);
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn chattering_switch_never_settles() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    // Flip every 400 ms for a minute, always faster than the 1 s window.
    for i in 0..150u64 {
        let at = ms(i * 400);
        r.push_sample(S0, i % 2 == 1, at);
        run_to(&mut r, &clock, at, 100);
    }
    assert!(r.dispatcher(S0).unwrap().actions.is_empty());
    assert!(!r.status(S0).unwrap().filament_detected);
}

#[test]
fn repeated_identical_samples_confirm_from_first_edge() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    for i in 0..10u64 {
        r.push_sample(S0, true, ms(i * 100));
    }
    run_to(&mut r, &clock, ms(5000), 50);
    assert_eq!(r.dispatcher(S0).unwrap().actions, vec![(Action::TurnOffFeeder, ms(1000))]);
    assert!(r.status(S0).unwrap().filament_detected);
}

// ── Job gating ────────────────────────────────────────────────

#[test]
fn idle_machine_forces_feeder_off() {
    let clock = ManualClock::default();
    let job = Cell::new(false);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(60_000), 500);
    assert_eq!(r.dispatcher(S0).unwrap().kinds(), vec![Action::TurnOffFeeder]);
}

#[test]
fn job_transitions_drive_feeder() {
    let clock = ManualClock::default();
    let job = Cell::new(false);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(2000), 100);
    job.set(true);
    run_to(&mut r, &clock, ms(3000), 100);
    job.set(false);
    run_to(&mut r, &clock, ms(20_000), 100);

    assert_eq!(r.dispatcher(S0).unwrap().actions, vec![
        (Action::TurnOffFeeder, ms(1000)),
        (Action::TurnOnFeeder, ms(2100)),
        (Action::TurnOffFeeder, ms(3100)),
    ]);
}

// ── Enable / disable ──────────────────────────────────────────

#[test]
fn disabled_sensor_stays_silent_and_catches_up_on_enable() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let settings = SensorSettings {
        enabled: false,
        ..SensorSettings::default()
    };
    let mut r = single_sensor(&clock, &job, settings, RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(30_000), 500);
    assert!(r.dispatcher(S0).unwrap().actions.is_empty());

    let reply = r.command(S0, SensorCommand::SetEnabled(true)).unwrap();
    assert_eq!(reply.to_string(), "Pellet Sensor hopper: enabled");
    assert_eq!(r.dispatcher(S0).unwrap().actions, vec![(Action::TurnOnFeeder, ms(30_000))]);
}

#[test]
fn disabling_mid_runout_stops_feeder_and_watchdog() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(5000), 100);
    r.command(S0, SensorCommand::SetEnabled(false));
    run_to(&mut r, &clock, ms(60_000), 500);

    assert_eq!(r.dispatcher(S0).unwrap().kinds(), vec![
        Action::TurnOnFeeder,
        Action::TurnOffFeeder,
    ]);
    assert!(!r.status(S0).unwrap().enabled);
}

#[test]
fn query_follows_debounced_value() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = single_sensor(&clock, &job, SensorSettings::default(), RecordingDispatcher::default());

    r.push_sample(S0, true, ms(0));
    run_to(&mut r, &clock, ms(500), 100);
    let q = r.command(S0, SensorCommand::Query).unwrap();
    assert_eq!(q.to_string(), "Pellet Sensor hopper: pellet not detected");

    run_to(&mut r, &clock, ms(1500), 100);
    let q = r.command(S0, SensorCommand::Query).unwrap();
    assert_eq!(q.to_string(), "Pellet Sensor hopper: pellet detected");
}

// ── Watchdog policy ───────────────────────────────────────────

#[test]
fn repeat_emergency_refires_until_refilled() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let settings = SensorSettings {
        repeat_emergency: true,
        emergency_time: Duration::from_secs(5),
        ..SensorSettings::default()
    };
    let mut r = single_sensor(&clock, &job, settings, RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    r.push_sample(S0, true, ms(17_000));
    run_to(&mut r, &clock, ms(60_000), 100);

    assert_eq!(r.dispatcher(S0).unwrap().actions, vec![
        (Action::TurnOnFeeder, ms(1000)),
        (Action::Emergency, ms(6000)),
        (Action::Emergency, ms(11_000)),
        (Action::Emergency, ms(16_000)),
        (Action::TurnOffFeeder, ms(18_000)),
    ]);
}

#[test]
fn emergency_disabled_by_config() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let settings = SensorConfig::from_json(r#"{ "enable_emergency": false }"#)
        .unwrap()
        .validate()
        .unwrap();
    let mut r = single_sensor(&clock, &job, settings, RecordingDispatcher::default());

    r.push_sample(S0, false, ms(0));
    run_to(&mut r, &clock, ms(120_000), 1000);
    assert_eq!(r.dispatcher(S0).unwrap().kinds(), vec![Action::TurnOnFeeder]);
}

// ── Multiple sensors ──────────────────────────────────────────

#[test]
fn sensors_are_independent() {
    let clock = ManualClock::default();
    let job = Cell::new(true);
    let mut r = Reactor::new(&clock, || job.get());

    let left = SensorConfig::from_json(r#"{ "name": "left", "debounce_time": 0.5 }"#).unwrap();
    let right = SensorConfig::from_json(r#"{ "name": "right", "debounce_time": 2.0 }"#).unwrap();
    let l = r
        .add_sensor(RunoutSensor::from_config(&left).unwrap(), RecordingDispatcher::default())
        .unwrap();
    let rt = r
        .add_sensor(RunoutSensor::from_config(&right).unwrap(), RecordingDispatcher::default())
        .unwrap();
    assert_eq!(r.find("right"), Some(rt));

    r.push_sample(l, false, ms(0));
    r.push_sample(rt, true, ms(0));
    run_to(&mut r, &clock, ms(3000), 100);

    assert_eq!(r.dispatcher(l).unwrap().actions, vec![(Action::TurnOnFeeder, ms(500))]);
    assert_eq!(r.dispatcher(rt).unwrap().actions, vec![(Action::TurnOffFeeder, ms(2000))]);
    let names: Vec<_> = r.statuses().map(|s| s.name.to_string()).collect();
    assert_eq!(names, ["left", "right"]);
}
