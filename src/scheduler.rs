//! Fixed-capacity timer queue.
//!
//! Backs the [`Scheduler`] port for the reactor. Debounce rechecks and
//! watchdog expiries are stored as one-shot entries; the reactor pops them
//! in deadline order and routes each payload back to its owner.
//!
//! ```text
//!  Debouncer ──schedule_after──▶ ┌─────────────┐
//!  Watchdog  ──schedule_after──▶ │ TimerQueue  │──pop_due(now)──▶ Reactor
//!            ◀──────cancel────── └─────────────┘
//! ```
//!
//! Tokens are handed out from a monotonically increasing counter, so a
//! cancelled or already-fired token can never alias a live entry (until
//! the counter wraps after 2³² schedules).

use core::time::Duration;

use heapless::Vec;
use log::debug;

use crate::app::ports::Scheduler;
use crate::error::ScheduleError;
use crate::time::Instant;

// ═══════════════════════════════════════════════════════════════
//  Timer types
// ═══════════════════════════════════════════════════════════════

/// Maximum number of live timers (stack-allocated).
pub const MAX_TIMERS: usize = 16;

/// Handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u32);

impl TimerToken {
    /// For host schedulers that mint their own handles.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// What a timer means to the component that scheduled it.
///
/// The generation is the owner's counter at scheduling time; an expiry
/// whose generation no longer matches is ignored by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    DebounceRecheck { generation: u32 },
    WatchdogExpiry { generation: u32 },
}

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    token: TimerToken,
    deadline: Instant,
    payload: T,
}

// ═══════════════════════════════════════════════════════════════
//  Queue
// ═══════════════════════════════════════════════════════════════

/// One-shot timer queue, generic over the payload so the reactor can tag
/// entries with the owning sensor.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<TimerEntry<T>, MAX_TIMERS>,
    next_token: u32,
    /// Reference point for [`Scheduler::schedule_after`].
    now: Instant,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_token: 0,
            now: Instant::ZERO,
        }
    }

    /// Schedule `payload` to fire at `deadline`.
    pub fn schedule_at(
        &mut self,
        deadline: Instant,
        payload: T,
    ) -> Result<TimerToken, ScheduleError> {
        let token = TimerToken(self.next_token);
        self.entries
            .push(TimerEntry {
                token,
                deadline,
                payload,
            })
            .map_err(|_| ScheduleError::QueueFull)?;
        self.next_token = self.next_token.wrapping_add(1);
        Ok(token)
    }

    /// Remove a pending timer. Returns `false` if it already fired or never
    /// existed.
    pub fn cancel_token(&mut self, token: TimerToken) -> bool {
        match self.entries.iter().position(|e| e.token == token) {
            Some(i) => {
                self.entries.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Pop the earliest timer due at or before `now`. Ties fire in
    /// scheduling order. Also moves the queue's reference point to the
    /// popped deadline.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerToken, Instant, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.token.0.wrapping_sub(self.next_token)))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        self.now = self.now.max(entry.deadline);
        debug!("timer {:?} due at {}us", entry.token, entry.deadline.as_micros());
        Some((entry.token, entry.deadline, entry.payload))
    }

    /// Move the reference point used by relative scheduling.
    pub fn set_now(&mut self, now: Instant) {
        self.now = now;
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Scheduler for TimerQueue<TimerEvent> {
    fn schedule_after(
        &mut self,
        delay: Duration,
        event: TimerEvent,
    ) -> Result<TimerToken, ScheduleError> {
        let deadline = self.now + delay;
        self.schedule_at(deadline, event)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancel_token(token);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
