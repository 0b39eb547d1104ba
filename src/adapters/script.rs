//! Script dispatcher adapter.
//!
//! Implements [`ActionDispatcher`] by rendering the per-action script
//! template and handing it to the host's [`ScriptRunner`]:
//!
//! | Action          | Script             |
//! |-----------------|--------------------|
//! | `TurnOnFeeder`  | `runout_script`    |
//! | `TurnOffFeeder` | `filledup_script`  |
//! | `Emergency`     | `emergency_script` |
//!
//! Every script is followed by `M400` so the host waits for queued moves
//! before carrying on. With `pause_on_runout` set, the runout script is
//! prefixed with `PAUSE` and runs even when no runout template exists.
//!
//! Failures never leave this module: they are logged and dropped.

use core::fmt::Write as _;

use log::{debug, error};

use crate::app::events::Action;
use crate::app::ports::{ActionDispatcher, ScriptRunner};
use crate::app::service::RunoutSensor;
use crate::config::SensorConfig;
use crate::error::DispatchError;
use crate::time::Instant;

// ───────────────────────────────────────────────────────────────
// Template
// ───────────────────────────────────────────────────────────────

/// Values available to a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub sensor: &'a str,
    pub action: Action,
    pub eventtime: Instant,
}

/// Script template with `{sensor}`, `{action}` and `{eventtime}`
/// placeholders. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Wrap `source`, rejecting malformed placeholders up front.
    pub fn parse(source: &str) -> Result<Self, DispatchError> {
        let t = Self {
            source: source.to_owned(),
        };
        // Dry run with placeholder values; only the syntax matters here.
        t.render(&TemplateVars {
            sensor: "",
            action: Action::TurnOnFeeder,
            eventtime: Instant::ZERO,
        })?;
        Ok(t)
    }

    pub fn render(&self, vars: &TemplateVars<'_>) -> Result<String, DispatchError> {
        let mut out = String::with_capacity(self.source.len());
        let mut chars = self.source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => return Err(DispatchError::UnterminatedPlaceholder),
                        }
                    }
                    match name.trim() {
                        "sensor" => out.push_str(vars.sensor),
                        "action" => out.push_str(vars.action.as_str()),
                        "eventtime" => {
                            let _ = write!(out, "{:.3}", vars.eventtime.as_secs_f64());
                        }
                        _ => return Err(DispatchError::UnknownPlaceholder),
                    }
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => return Err(DispatchError::UnbalancedBrace),
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

/// Build a sensor and its script dispatcher from one config block.
///
/// Fails with [`Error::Config`](crate::Error::Config) for bad settings and
/// [`Error::Dispatch`](crate::Error::Dispatch) for a malformed template.
pub fn scripted_sensor<R: ScriptRunner>(
    config: &SensorConfig,
    runner: R,
) -> crate::Result<(RunoutSensor, ScriptDispatcher<R>)> {
    let sensor = RunoutSensor::from_config(config)?;
    let scripts = ScriptDispatcher::from_config(config, runner)?;
    Ok((sensor, scripts))
}

/// Runs the configured script for each action.
pub struct ScriptDispatcher<R> {
    sensor: String,
    pause_on_runout: bool,
    runout: Option<Template>,
    filledup: Option<Template>,
    emergency: Option<Template>,
    runner: R,
}

impl<R: ScriptRunner> ScriptDispatcher<R> {
    pub fn new(sensor: &str, pause_on_runout: bool, runner: R) -> Self {
        Self {
            sensor: sensor.to_owned(),
            pause_on_runout,
            runout: None,
            filledup: None,
            emergency: None,
            runner,
        }
    }

    /// Build from a sensor config, parsing its three templates.
    pub fn from_config(config: &SensorConfig, runner: R) -> Result<Self, DispatchError> {
        let parse = |s: &Option<String>| s.as_deref().map(Template::parse).transpose();
        Ok(Self {
            runout: parse(&config.runout_script)?,
            filledup: parse(&config.filledup_script)?,
            emergency: parse(&config.emergency_script)?,
            ..Self::new(&config.name, config.pause_on_runout, runner)
        })
    }

    #[must_use]
    pub fn with_script(mut self, action: Action, template: Template) -> Self {
        *self.slot(action) = Some(template);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Render the full script for `action`, or `None` if nothing runs.
    pub fn render(&self, action: Action, at: Instant) -> Result<Option<String>, DispatchError> {
        let template = match action {
            Action::TurnOnFeeder => self.runout.as_ref(),
            Action::TurnOffFeeder => self.filledup.as_ref(),
            Action::Emergency => self.emergency.as_ref(),
        };
        let pause = action == Action::TurnOnFeeder && self.pause_on_runout;
        if template.is_none() && !pause {
            return Ok(None);
        }

        let vars = TemplateVars {
            sensor: &self.sensor,
            action,
            eventtime: at,
        };
        let body = template.map(|t| t.render(&vars)).transpose()?.unwrap_or_default();

        let mut script = String::with_capacity(body.len() + 16);
        if pause {
            script.push_str("PAUSE\n");
        }
        script.push_str(&body);
        script.push_str("\nM400");
        Ok(Some(script))
    }

    fn slot(&mut self, action: Action) -> &mut Option<Template> {
        match action {
            Action::TurnOnFeeder => &mut self.runout,
            Action::TurnOffFeeder => &mut self.filledup,
            Action::Emergency => &mut self.emergency,
        }
    }
}

impl<R: ScriptRunner> ActionDispatcher for ScriptDispatcher<R> {
    fn dispatch(&mut self, action: Action, at: Instant) {
        let script = match self.render(action, at) {
            Ok(Some(s)) => s,
            Ok(None) => {
                debug!("sensor '{}': no script for {}", self.sensor, action);
                return;
            }
            Err(e) => {
                error!("sensor '{}': {} script render failed: {e}", self.sensor, action);
                return;
            }
        };
        if let Err(e) = self.runner.run_script(&script) {
            error!("sensor '{}': {} script failed: {e}", self.sensor, action);
        }
    }
}
