//! Single-threaded reactor.
//!
//! Owns every configured [`RunoutSensor`], the pending-sample FIFO and the
//! timer queue, and interleaves the two in time order. All mutation
//! happens inside [`Reactor::poll`], on the caller's thread; there are no
//! locks.
//!
//! ```text
//!  push_sample ──▶ SampleQueue ─┐
//!                               ├──▶ poll(now) ──▶ RunoutSensor ──▶ dispatcher
//!  TimerQueue ──(due timers)────┘         ▲
//!        ▲                                │
//!        └──── SensorTimers (per event) ──┘
//! ```
//!
//! Each poll:
//! 1. Reads `now` from the clock and asks the host whether a job is
//!    running. If the answer changed, every sensor is re-evaluated.
//! 2. Repeatedly handles the earliest of (next queued sample, next due
//!    timer) with a time `≤ now`. On a tie the timer goes first, so a value
//!    that held for exactly the debounce window is committed before the
//!    contradicting sample arrives.

use core::time::Duration;

use heapless::Vec;
use log::{debug, info};

use crate::app::commands::{CommandReply, SensorCommand};
use crate::app::events::SensorStatus;
use crate::app::ports::{ActionDispatcher, Clock, JobActivity, Scheduler};
use crate::app::service::RunoutSensor;
use crate::error::{ConfigError, ScheduleError};
use crate::events::{SampleEvent, SampleQueue, SensorId};
use crate::scheduler::{MAX_TIMERS, TimerEvent, TimerQueue, TimerToken};
use crate::sensors::RawSample;
use crate::time::Instant;

/// Each sensor holds at most one debounce recheck and one watchdog expiry.
pub const MAX_SENSORS: usize = MAX_TIMERS / 2;

type Timers = TimerQueue<(SensorId, TimerEvent)>;

// ───────────────────────────────────────────────────────────────
// Per-event scheduler view
// ───────────────────────────────────────────────────────────────

/// [`Scheduler`] handed to one sensor while it processes one event.
/// Delays count from the event's own time and expiries are tagged with
/// the sensor so the reactor can route them back.
struct SensorTimers<'a> {
    queue: &'a mut Timers,
    sensor: SensorId,
    now: Instant,
}

impl Scheduler for SensorTimers<'_> {
    fn schedule_after(
        &mut self,
        delay: Duration,
        event: TimerEvent,
    ) -> Result<TimerToken, ScheduleError> {
        self.queue.schedule_at(self.now + delay, (self.sensor, event))
    }

    fn cancel(&mut self, token: TimerToken) {
        self.queue.cancel_token(token);
    }
}

// ───────────────────────────────────────────────────────────────
// Reactor
// ───────────────────────────────────────────────────────────────

struct Slot<D> {
    sensor: RunoutSensor,
    dispatcher: D,
}

pub struct Reactor<C, J, D> {
    clock: C,
    job: J,
    slots: Vec<Slot<D>, MAX_SENSORS>,
    samples: SampleQueue,
    timers: Timers,
    /// Job state seen by the previous poll.
    last_job: Option<bool>,
}

impl<C: Clock, J: JobActivity, D: ActionDispatcher> Reactor<C, J, D> {
    pub fn new(clock: C, job: J) -> Self {
        Self {
            clock,
            job,
            slots: Vec::new(),
            samples: SampleQueue::new(),
            timers: TimerQueue::new(),
            last_job: None,
        }
    }

    /// Register a sensor with its dispatcher. Names must be unique.
    pub fn add_sensor(
        &mut self,
        sensor: RunoutSensor,
        dispatcher: D,
    ) -> Result<SensorId, ConfigError> {
        if self.find(sensor.name()).is_some() {
            return Err(ConfigError::Invalid("duplicate sensor name"));
        }
        let id = SensorId(self.slots.len() as u8);
        self.slots
            .push(Slot { sensor, dispatcher })
            .map_err(|_| ConfigError::Invalid("too many sensors"))?;
        if let Some(slot) = self.slots.last() {
            info!("reactor: sensor '{}' registered as {:?}", slot.sensor.name(), id);
        }
        Ok(id)
    }

    /// Look a sensor up by name.
    pub fn find(&self, name: &str) -> Option<SensorId> {
        self.slots
            .iter()
            .position(|s| s.sensor.name() == name)
            .map(|i| SensorId(i as u8))
    }

    /// Queue a raw sample. Returns `false` if the sensor is unknown or the
    /// queue is full.
    pub fn push_sample(&mut self, sensor: SensorId, present: bool, at: Instant) -> bool {
        if usize::from(sensor.0) >= self.slots.len() {
            return false;
        }
        self.samples.push(SampleEvent {
            sensor,
            present,
            at,
        })
    }

    /// Process everything due up to the clock's current time. Returns the
    /// number of samples and timers handled.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        self.poll_job_activity(now);

        let mut handled = 0;
        loop {
            let sample_at = self.samples.peek().map(|s| s.at).filter(|at| *at <= now);
            let timer_at = self.timers.next_deadline().filter(|at| *at <= now);

            let timer_first = match (sample_at, timer_at) {
                (None, None) => break,
                (Some(s), Some(t)) => t <= s,
                (None, Some(_)) => true,
                (Some(_), None) => false,
            };

            if timer_first {
                let Some((_, at, (sensor, event))) = self.timers.pop_due(now) else {
                    break;
                };
                let Some(slot) = self.slots.get_mut(usize::from(sensor.0)) else {
                    continue;
                };
                let mut sched = SensorTimers {
                    queue: &mut self.timers,
                    sensor,
                    now: at,
                };
                slot.sensor
                    .on_timer(event, at, &self.job, &mut sched, &mut slot.dispatcher);
            } else {
                let Some(ev) = self.samples.pop() else {
                    break;
                };
                let Some(slot) = self.slots.get_mut(usize::from(ev.sensor.0)) else {
                    continue;
                };
                let mut sched = SensorTimers {
                    queue: &mut self.timers,
                    sensor: ev.sensor,
                    now: ev.at,
                };
                let raw = RawSample {
                    present: ev.present,
                    timestamp: ev.at,
                };
                slot.sensor.on_sample(raw, &mut sched);
            }
            handled += 1;
        }
        if handled > 0 {
            debug!("reactor: handled {handled} events at {}us", now.as_micros());
        }
        handled
    }

    /// Run a console command against one sensor.
    pub fn command(&mut self, sensor: SensorId, cmd: SensorCommand) -> Option<CommandReply> {
        let now = self.clock.now();
        let slot = self.slots.get_mut(usize::from(sensor.0))?;
        let mut sched = SensorTimers {
            queue: &mut self.timers,
            sensor,
            now,
        };
        Some(
            slot.sensor
                .handle_command(cmd, now, &self.job, &mut sched, &mut slot.dispatcher),
        )
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let sample = self.samples.peek().map(|s| s.at);
        match (sample, self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn sensor(&self, id: SensorId) -> Option<&RunoutSensor> {
        self.slots.get(usize::from(id.0)).map(|s| &s.sensor)
    }

    pub fn dispatcher(&self, id: SensorId) -> Option<&D> {
        self.slots.get(usize::from(id.0)).map(|s| &s.dispatcher)
    }

    pub fn status(&self, id: SensorId) -> Option<SensorStatus> {
        self.sensor(id).map(RunoutSensor::status)
    }

    /// Status of every sensor, in registration order.
    pub fn statuses(&self) -> impl Iterator<Item = SensorStatus> + '_ {
        self.slots.iter().map(|s| s.sensor.status())
    }

    pub fn sensor_count(&self) -> usize {
        self.slots.len()
    }

    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn dropped_samples(&self) -> u32 {
        self.samples.dropped()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    // ── Internal ──────────────────────────────────────────────

    fn poll_job_activity(&mut self, now: Instant) {
        let active = self.job.is_job_active();
        let previous = self.last_job.replace(active);
        if previous.is_none_or(|p| p == active) {
            return;
        }
        info!("reactor: job {}", if active { "started" } else { "stopped" });
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let mut sched = SensorTimers {
                queue: &mut self.timers,
                sensor: SensorId(i as u8),
                now,
            };
            slot.sensor
                .on_job_activity_changed(active, now, &mut sched, &mut slot.dispatcher);
        }
    }
}
