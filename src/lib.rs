//! Hopper-feed runout controller library.
//!
//! Debounces a hopper presence switch, decides when the feeder runs, and
//! escalates a runout that never resolves. Host integrations (clock, timer
//! queue, job state, scripts, relay pin) live behind the traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod events;
pub mod fsm;
pub mod reactor;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod time;

mod error;

pub use error::{ConfigError, DispatchError, Error, Result, ScheduleError};
