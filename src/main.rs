//! hopperfeed-sim — replay a sample trace through the runout controller.
//!
//! ```text
//!  config.json ──▶ RunoutSensor × N ──┐
//!                                     ├──▶ Reactor ──▶ ScriptDispatcher + LogDispatcher
//!  trace.json ──▶ samples · jobs ─────┘       ▲
//!                                             │
//!                          ManualClock (stepped every --step-ms)
//! ```
//!
//! The trace is replayed on a virtual clock, so a run is deterministic and
//! finishes as fast as the host can compute it. Final sensor status is
//! printed to stdout as JSON; everything else goes to the log
//! (`RUST_LOG`, default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use core::time::Duration;
use log::info;
use serde::Deserialize;

use hopperfeed::adapters::idle_timeout::{IdleTimeoutState, JobFlag};
use hopperfeed::adapters::log_sink::{LogDispatcher, LogScriptRunner};
use hopperfeed::adapters::script::{ScriptDispatcher, scripted_sensor};
use hopperfeed::adapters::time::ManualClock;
use hopperfeed::app::commands::SensorCommand;
use hopperfeed::app::ports::{ActionDispatcher, Clock};
use hopperfeed::config::SensorConfig;
use hopperfeed::reactor::Reactor;
use hopperfeed::time::Instant;

type SimDispatcher = (ScriptDispatcher<LogScriptRunner>, LogDispatcher);

// ── CLI ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hopperfeed-sim", version, about = "Replay a presence trace through the hopper-feed controller")]
struct Args {
    /// Sensor configuration (JSON: `{ "sensors": [ ... ] }`).
    #[arg(short, long)]
    config: PathBuf,

    /// Sample trace to replay (JSON).
    #[arg(short, long)]
    trace: PathBuf,

    /// Virtual clock step in milliseconds.
    #[arg(long, default_value_t = 10)]
    step_ms: u64,
}

// ── Input documents ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SimConfig {
    sensors: Vec<SensorConfig>,
}

#[derive(Debug, Deserialize)]
struct Trace {
    #[serde(default)]
    samples: Vec<TraceSample>,
    /// Intervals (seconds) during which a job is running.
    #[serde(default)]
    jobs: Vec<JobWindow>,
    #[serde(default)]
    commands: Vec<TraceCommand>,
    /// End of the replay, in seconds.
    until: f64,
}

#[derive(Debug, Deserialize)]
struct TraceSample {
    sensor: String,
    at: f64,
    present: bool,
}

#[derive(Debug, Deserialize)]
struct JobWindow {
    start: f64,
    end: f64,
}

#[derive(Debug, Deserialize)]
struct TraceCommand {
    sensor: String,
    at: f64,
    verb: Verb,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Verb {
    Query,
    Enable,
    Disable,
}

impl From<Verb> for SensorCommand {
    fn from(v: Verb) -> Self {
        match v {
            Verb::Query => SensorCommand::Query,
            Verb::Enable => SensorCommand::SetEnabled(true),
            Verb::Disable => SensorCommand::SetEnabled(false),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if args.step_ms == 0 {
        bail!("--step-ms must be at least 1");
    }

    let config: SimConfig = read_json(&args.config).context("loading sensor config")?;
    let mut trace: Trace = read_json(&args.trace).context("loading trace")?;

    let clock = ManualClock::new(Instant::ZERO);
    let mut reactor: Reactor<&ManualClock, JobFlag, SimDispatcher> =
        Reactor::new(&clock, JobFlag::default());

    for sc in &config.sensors {
        let (sensor, scripts) = scripted_sensor(sc, LogScriptRunner::new())
            .map_err(|e| anyhow!("sensor '{}': {e}", sc.name))?;
        reactor
            .add_sensor(sensor, (scripts, LogDispatcher))
            .map_err(|e| anyhow!("sensor '{}': {e}", sc.name))?;
    }
    info!("loaded {} sensor(s)", reactor.sensor_count());

    replay(&mut reactor, &clock, &mut trace, Duration::from_millis(args.step_ms))?;

    let statuses: Vec<_> = reactor.statuses().collect();
    let json = serde_json::to_string_pretty(&statuses)
        .map_err(|e| anyhow!("serialising status: {e}"))?;
    println!("{json}");

    if reactor.dropped_samples() > 0 {
        log::warn!("{} sample(s) dropped: queue overrun", reactor.dropped_samples());
    }
    Ok(())
}

/// Drive `reactor` through `trace` on `clock`, one `step` at a time.
///
/// Samples are delivered at their own timestamps rather than batched per
/// step, so timers that fall between two samples fire in order and a burst
/// denser than the sample queue is never truncated.
fn replay<D: ActionDispatcher>(
    reactor: &mut Reactor<&ManualClock, JobFlag, D>,
    clock: &ManualClock,
    trace: &mut Trace,
    step: Duration,
) -> Result<()> {
    trace.samples.sort_by(|a, b| a.at.total_cmp(&b.at));
    trace.commands.sort_by(|a, b| a.at.total_cmp(&b.at));

    let until = Instant::from_secs_f64(trace.until);
    let mut samples = trace.samples.iter().peekable();
    let mut commands = trace.commands.iter().peekable();
    let mut now = clock.now();

    loop {
        while let Some(s) = samples.next_if(|s| Instant::from_secs_f64(s.at) <= now) {
            let id = reactor
                .find(&s.sensor)
                .with_context(|| format!("trace names unknown sensor '{}'", s.sensor))?;
            let at = Instant::from_secs_f64(s.at).max(clock.now());
            clock.set(at);
            if !reactor.push_sample(id, s.present, at) {
                bail!("sample queue refused '{}' at {:.4}s", s.sensor, s.at);
            }
            reactor.poll();
        }

        clock.set(now);
        let t = now.as_secs_f64();
        let printing = trace.jobs.iter().any(|w| w.start <= t && t < w.end);
        reactor.job().set(if printing {
            IdleTimeoutState::Printing
        } else {
            IdleTimeoutState::Ready
        });
        reactor.poll();

        while let Some(c) = commands.next_if(|c| Instant::from_secs_f64(c.at) <= now) {
            let id = reactor
                .find(&c.sensor)
                .with_context(|| format!("trace names unknown sensor '{}'", c.sensor))?;
            if let Some(reply) = reactor.command(id, c.verb.into()) {
                info!("{reply}");
            }
        }

        if now >= until {
            return Ok(());
        }
        now = now + step;
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| anyhow!("{}: {e}", path.display()))
}
