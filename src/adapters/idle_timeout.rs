//! Job-activity adapter.
//!
//! The host reports its idle-timeout state (`Idle`, `Ready`, `Printing`);
//! only `Printing` means a job is consuming material. [`JobFlag`] stores
//! the latest report and answers [`JobActivity`] queries from it.

use core::cell::Cell;

use crate::app::ports::JobActivity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdleTimeoutState {
    #[default]
    Idle,
    Ready,
    Printing,
}

/// Latest host job state.
#[derive(Debug, Default)]
pub struct JobFlag {
    state: Cell<IdleTimeoutState>,
}

impl JobFlag {
    pub fn new(state: IdleTimeoutState) -> Self {
        Self {
            state: Cell::new(state),
        }
    }

    pub fn set(&self, state: IdleTimeoutState) {
        self.state.set(state);
    }

    pub fn get(&self) -> IdleTimeoutState {
        self.state.get()
    }
}

impl JobActivity for JobFlag {
    fn is_job_active(&self) -> bool {
        self.state.get() == IdleTimeoutState::Printing
    }
}
