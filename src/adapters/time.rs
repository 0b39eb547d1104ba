//! Clock adapters.
//!
//! - [`MonotonicClock`] — wall-monotonic time from `std::time::Instant`,
//!   measured from construction (the controller's "boot").
//! - [`ManualClock`] — a virtual clock the caller moves by hand, for
//!   simulation and tests.

use core::cell::Cell;
use core::time::Duration;

use crate::app::ports::Clock;
use crate::time::Instant;

/// Real-time clock for host-side deployment.
pub struct MonotonicClock {
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since construction (monotonic).
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.uptime_us())
    }
}

/// Virtual clock. Interior mutability lets the reactor own a shared
/// reference while the driver keeps advancing it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
