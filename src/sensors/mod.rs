//! Presence sensing — raw switch samples and their debounced form.
//!
//! The host's input driver produces a [`RawSample`] on every switch edge
//! or poll; the [`Debouncer`](debounce::Debouncer) turns those into
//! [`StablePresence`] values that the state machine is allowed to act on.

pub mod debounce;

use crate::time::Instant;

/// One raw reading from the presence switch. Polarity has already been
/// resolved by the host: `true` means material is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub present: bool,
    pub timestamp: Instant,
}

/// A debounced, trusted presence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StablePresence {
    pub present: bool,
    /// When the value was confirmed (end of the debounce window).
    pub since: Instant,
}
