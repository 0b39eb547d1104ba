//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the business rules for one hopper sensor: debounce
//! results in, feeder decisions and emergencies out. All interaction with
//! the host happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real hardware.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
