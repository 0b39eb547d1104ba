//! Pending raw-sample queue.
//!
//! Samples are produced by the host's input callbacks (switch edges and
//! polls) and consumed by the [`Reactor`](crate::reactor::Reactor) loop,
//! one at a time in arrival order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Edge cb     │────▶│              │     │              │
//! │ Poll cb     │────▶│ Sample Queue │────▶│   Reactor    │
//! │ Replay      │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The queue is bounded like an ISR ring buffer: when it is full the new
//! sample is dropped and the producer is told so.

use heapless::Deque;

use crate::time::Instant;

/// Maximum number of pending samples.
pub const SAMPLE_QUEUE_CAP: usize = 32;

/// Index of a sensor registered with the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorId(pub u8);

/// A raw sample tagged with the sensor it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEvent {
    pub sensor: SensorId,
    pub present: bool,
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct SampleQueue {
    inner: Deque<SampleEvent, SAMPLE_QUEUE_CAP>,
    dropped: u32,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sample. Returns `false` if the queue is full (sample
    /// dropped).
    pub fn push(&mut self, event: SampleEvent) -> bool {
        if self.inner.push_back(event).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            log::warn!("sample queue full, dropped {:?}", event.sensor);
            return false;
        }
        true
    }

    pub fn pop(&mut self) -> Option<SampleEvent> {
        self.inner.pop_front()
    }

    pub fn peek(&self) -> Option<&SampleEvent> {
        self.inner.front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Samples dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
