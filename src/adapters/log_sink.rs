//! Log-based adapters.
//!
//! [`LogScriptRunner`] implements [`ScriptRunner`] by writing each script
//! to the log instead of executing it, and [`LogDispatcher`] logs every
//! action. The simulation binary uses both; a real host plugs its G-code
//! queue in behind the same trait.

use log::info;

use crate::app::events::Action;
use crate::app::ports::{ActionDispatcher, ScriptRunner};
use crate::error::DispatchError;
use crate::time::Instant;

/// Script runner that only logs.
#[derive(Debug, Default)]
pub struct LogScriptRunner {
    executed: u32,
}

impl LogScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts "run" so far.
    pub fn executed(&self) -> u32 {
        self.executed
    }
}

impl ScriptRunner for LogScriptRunner {
    fn run_script(&mut self, script: &str) -> Result<(), DispatchError> {
        self.executed += 1;
        for line in script.lines() {
            info!("GCODE | {}", line);
        }
        Ok(())
    }
}

/// Dispatcher that logs each action with its time.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl ActionDispatcher for LogDispatcher {
    fn dispatch(&mut self, action: Action, at: Instant) {
        info!("ACTION | {} at {:.3}s", action, at.as_secs_f64());
    }
}
