//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the reactor end to end
//! against mock host adapters. Everything runs on a virtual clock.

mod dispatch_tests;
mod mock_hw;
mod scenario_tests;
