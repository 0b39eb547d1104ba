//! Monotonic time base shared by every component.
//!
//! An [`Instant`] is microseconds since controller boot, the same unit the
//! host's high-resolution timer reports. Keeping it a plain integer makes
//! the whole pipeline deterministic under a simulated clock.

use core::ops::Add;
use core::time::Duration;

/// A point on the controller's monotonic clock (µs since boot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant(u64);

impl Instant {
    /// Boot time.
    pub const ZERO: Self = Self(0);

    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1000))
    }

    /// Fractional seconds since boot, as host scripts see `eventtime`.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs.max(0.0) * 1_000_000.0) as u64)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    pub fn checked_add(self, d: Duration) -> Option<Self> {
        let us = u64::try_from(d.as_micros()).ok()?;
        self.0.checked_add(us).map(Self)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    /// Saturates at `u64::MAX` µs rather than wrapping.
    fn add(self, rhs: Duration) -> Instant {
        self.checked_add(rhs).unwrap_or(Instant(u64::MAX))
    }
}
