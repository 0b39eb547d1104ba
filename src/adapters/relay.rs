//! Feeder relay driver.
//!
//! Drives the feeder motor relay through any `embedded-hal` output pin.
//! High runs the feeder, low stops it.
//!
//! ## Safety contract
//!
//! `Emergency` forces the relay low even though the presence machine
//! still believes the feeder is on. The relay stays low until the next
//! `TurnOnFeeder`, which only comes after a `TurnOffFeeder`.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::app::events::Action;
use crate::app::ports::ActionDispatcher;
use crate::error::DispatchError;
use crate::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
    /// Forced off by the watchdog.
    Tripped,
}

pub struct FeederRelay<P> {
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> FeederRelay<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            error!("feeder relay: initial set_low failed");
        }
        Self {
            pin,
            state: RelayState::Off,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Release the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }

    fn drive(&mut self, high: bool) -> Result<(), DispatchError> {
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| DispatchError::PinWriteFailed)
    }
}

impl<P: OutputPin> ActionDispatcher for FeederRelay<P> {
    fn dispatch(&mut self, action: Action, _at: Instant) {
        let (high, next) = match action {
            Action::TurnOnFeeder => (true, RelayState::On),
            Action::TurnOffFeeder => (false, RelayState::Off),
            Action::Emergency => (false, RelayState::Tripped),
        };
        match self.drive(high) {
            Ok(()) => {
                if next != self.state {
                    info!("feeder relay: {:?} -> {:?}", self.state, next);
                }
                self.state = next;
            }
            Err(e) => error!("feeder relay: {action}: {e}"),
        }
    }
}
