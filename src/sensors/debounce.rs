//! Sliding-window debouncer for the hopper presence switch.
//!
//! ## Policy
//!
//! A raw value is committed only once it has held for the full window.
//! Every contradicting sample restarts the window, so a switch that
//! bounces faster than the window never stabilises:
//!
//! ```text
//!  raw:   ‾‾‾|__|‾‾|__________________
//!              ^  ^  ^── window opens ──▶ commit `false`
//!              restarts
//! ```
//!
//! Rechecks are scheduled through the [`Scheduler`] port and stamped with
//! a generation counter. Opening a new window bumps the generation and
//! cancels the previous recheck, so a superseded recheck is a guaranteed
//! no-op even if the host timer fires it anyway.

use core::time::Duration;

use crate::app::ports::Scheduler;
use crate::error::ScheduleError;
use crate::scheduler::{TimerEvent, TimerToken};
use crate::time::Instant;

use super::{RawSample, StablePresence};

pub struct Debouncer {
    window: Duration,
    /// Latest raw value that differs from its predecessor.
    tentative: Option<RawSample>,
    /// Last committed value.
    stable: Option<StablePresence>,
    generation: u32,
    pending: Option<TimerToken>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            tentative: None,
            stable: None,
            generation: 0,
            pending: None,
        }
    }

    /// Feed one raw sample.
    ///
    /// A sample equal to the tentative value changes nothing; the pending
    /// recheck (if any) will confirm it. A different value opens a new
    /// window starting at the sample's timestamp.
    ///
    /// If the recheck cannot be scheduled the tentative value is dropped,
    /// so the next sample of either polarity opens a fresh window.
    pub fn on_sample(
        &mut self,
        sample: RawSample,
        sched: &mut impl Scheduler,
    ) -> Result<(), ScheduleError> {
        if self.tentative.map(|t| t.present) == Some(sample.present) {
            return Ok(());
        }

        self.tentative = Some(sample);
        self.generation = self.generation.wrapping_add(1);
        if let Some(token) = self.pending.take() {
            sched.cancel(token);
        }

        let event = TimerEvent::DebounceRecheck {
            generation: self.generation,
        };
        match sched.schedule_after(self.window, event) {
            Ok(token) => {
                self.pending = Some(token);
                Ok(())
            }
            Err(e) => {
                self.tentative = None;
                Err(e)
            }
        }
    }

    /// Handle a recheck expiry. Returns the newly committed value, or
    /// `None` if the recheck was superseded.
    pub fn on_recheck(&mut self, generation: u32, now: Instant) -> Option<StablePresence> {
        if generation != self.generation || self.pending.is_none() {
            return None;
        }
        self.pending = None;
        let tentative = self.tentative?;
        let stable = StablePresence {
            present: tentative.present,
            since: now,
        };
        self.stable = Some(stable);
        Some(stable)
    }

    /// Last committed value.
    pub fn stable(&self) -> Option<StablePresence> {
        self.stable
    }

    pub fn tentative(&self) -> Option<RawSample> {
        self.tentative
    }

    /// A window is open and waiting for its recheck.
    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scheduler double that records every call.
    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: Vec<(TimerToken, Duration, TimerEvent)>,
        cancelled: Vec<TimerToken>,
        next: u32,
        full: bool,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule_after(
            &mut self,
            delay: Duration,
            event: TimerEvent,
        ) -> Result<TimerToken, ScheduleError> {
            if self.full {
                return Err(ScheduleError::QueueFull);
            }
            let tok = TimerToken::new(self.next);
            self.next += 1;
            self.scheduled.push((tok, delay, event));
            Ok(tok)
        }

        fn cancel(&mut self, token: TimerToken) {
            self.cancelled.push(token);
        }
    }

    impl RecordingScheduler {
        fn last_generation(&self) -> u32 {
            match self.scheduled.last().unwrap().2 {
                TimerEvent::DebounceRecheck { generation } => generation,
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    fn sample(present: bool, ms: u64) -> RawSample {
        RawSample {
            present,
            timestamp: Instant::from_millis(ms),
        }
    }

    #[test]
    fn first_sample_opens_window() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(true, 0), &mut s).unwrap();
        assert_eq!(s.scheduled.len(), 1);
        assert_eq!(s.scheduled[0].1, Duration::from_secs(1));
        assert!(d.is_settling());
        assert!(d.stable().is_none());
    }

    #[test]
    fn repeated_value_does_not_reschedule() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(false, 0), &mut s).unwrap();
        d.on_sample(sample(false, 300), &mut s).unwrap();
        d.on_sample(sample(false, 600), &mut s).unwrap();
        assert_eq!(s.scheduled.len(), 1);
        assert!(s.cancelled.is_empty());
        assert_eq!(d.tentative().unwrap().timestamp, Instant::from_millis(0));
    }

    #[test]
    fn recheck_commits_tentative() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(false, 0), &mut s).unwrap();
        let g = s.last_generation();

        let stable = d.on_recheck(g, Instant::from_millis(1000)).unwrap();
        assert!(!stable.present);
        assert_eq!(stable.since, Instant::from_millis(1000));
        assert_eq!(d.stable(), Some(stable));
        assert!(!d.is_settling());
    }

    #[test]
    fn contradicting_sample_supersedes_recheck() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(false, 0), &mut s).unwrap();
        let stale = s.last_generation();
        d.on_sample(sample(true, 400), &mut s).unwrap();

        assert_eq!(s.cancelled, vec![s.scheduled[0].0]);
        assert!(d.on_recheck(stale, Instant::from_millis(1000)).is_none());

        let fresh = s.last_generation();
        let stable = d.on_recheck(fresh, Instant::from_millis(1400)).unwrap();
        assert!(stable.present);
    }

    #[test]
    fn recheck_fires_once() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(true, 0), &mut s).unwrap();
        let g = s.last_generation();
        assert!(d.on_recheck(g, Instant::from_millis(1000)).is_some());
        assert!(d.on_recheck(g, Instant::from_millis(1000)).is_none());
    }

    #[test]
    fn bouncing_back_to_committed_value_reopens_window() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler::default();
        d.on_sample(sample(true, 0), &mut s).unwrap();
        d.on_recheck(s.last_generation(), Instant::from_millis(1000));

        // Glitch low then back high: the committed value stays `true`.
        d.on_sample(sample(false, 1500), &mut s).unwrap();
        d.on_sample(sample(true, 1550), &mut s).unwrap();
        assert!(d.stable().unwrap().present);
        let stable = d.on_recheck(s.last_generation(), Instant::from_millis(2550)).unwrap();
        assert!(stable.present);
    }

    #[test]
    fn scheduler_refusal_drops_tentative() {
        let mut d = Debouncer::new(Duration::from_secs(1));
        let mut s = RecordingScheduler {
            full: true,
            ..Default::default()
        };
        assert_eq!(d.on_sample(sample(true, 0), &mut s), Err(ScheduleError::QueueFull));
        assert!(d.tentative().is_none());
        assert!(!d.is_settling());

        s.full = false;
        d.on_sample(sample(true, 10), &mut s).unwrap();
        assert!(d.is_settling(), "next sample retries");
    }
}
