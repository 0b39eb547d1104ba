//! Mock host adapters for integration tests.
//!
//! Records every dispatched action, script and pin write so tests can
//! assert on the full history without a real controller.

use std::cell::Cell;
use std::convert::Infallible;

use hopperfeed::DispatchError;
use hopperfeed::adapters::time::ManualClock;
use hopperfeed::app::events::Action;
use hopperfeed::app::ports::{ActionDispatcher, ScriptRunner};
use hopperfeed::app::service::RunoutSensor;
use hopperfeed::config::SensorSettings;
use hopperfeed::reactor::Reactor;
use hopperfeed::time::Instant;

// ── Action recorder ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub actions: Vec<(Action, Instant)>,
}

#[allow(dead_code)]
impl RecordingDispatcher {
    pub fn kinds(&self) -> Vec<Action> {
        self.actions.iter().map(|(a, _)| *a).collect()
    }

    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|(a, _)| *a == action).count()
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, action: Action, at: Instant) {
        self.actions.push((action, at));
    }
}

// ── Relay pin ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub history: Vec<bool>,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.history.push(true);
        Ok(())
    }
}

// ── Script runner ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockScriptRunner {
    pub scripts: Vec<String>,
    /// Reject every script after recording it.
    pub fail: bool,
}

impl ScriptRunner for MockScriptRunner {
    fn run_script(&mut self, script: &str) -> Result<(), DispatchError> {
        self.scripts.push(script.to_owned());
        if self.fail {
            Err(DispatchError::ScriptFailed)
        } else {
            Ok(())
        }
    }
}

// ── Reactor harness ───────────────────────────────────────────

pub fn ms(v: u64) -> Instant {
    Instant::from_millis(v)
}

/// Build a one-sensor reactor on a virtual clock.
pub fn single_sensor<'a, D: ActionDispatcher>(
    clock: &'a ManualClock,
    job: &'a Cell<bool>,
    settings: SensorSettings,
    dispatcher: D,
) -> Reactor<&'a ManualClock, impl Fn() -> bool + 'a, D> {
    let mut r = Reactor::new(clock, move || job.get());
    r.add_sensor(RunoutSensor::new(settings), dispatcher)
        .expect("one sensor always fits");
    r
}

/// Step the clock in `step` increments up to `until`, polling each step.
pub fn run_to<J, D>(
    r: &mut Reactor<&ManualClock, J, D>,
    clock: &ManualClock,
    until: Instant,
    step_ms: u64,
) where
    J: hopperfeed::app::ports::JobActivity,
    D: ActionDispatcher,
{
    use hopperfeed::app::ports::Clock;
    while clock.now() < until {
        let next = (clock.now() + core::time::Duration::from_millis(step_ms)).min(until);
        clock.set(next);
        r.poll();
    }
}
