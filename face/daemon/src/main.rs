//! Face Daemon - Tick Loop for the LED Matrix Face
//!
//! Runs the face rig at its configured rate against simulated sensors and
//! emits every frame to a renderer. With no panel attached, frames go to
//! the log or to stdout as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (~/.config/matrix-face/face.toml if present)
//! face-daemon
//!
//! # Reproducible run, JSON frames on stdout
//! face-daemon --seed 7 --output json
//!
//! # Run 350 ticks (about ten seconds) then exit
//! face-daemon --ticks 350
//!
//! # Verbose logging
//! RUST_LOG=face_core=debug face-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Stop after the current tick

mod renderer;
mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use face_core::config::{default_config_path, load_config_from_path, ConfigOverrides, FaceConfig};
use face_core::{Clock, FaceRig, MonotonicClock, Renderer};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use renderer::{JsonLinesRenderer, LogRenderer};
use sim::{SimulatedAccelerometer, SimulatedMicrophone};

/// Where frames are sent
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Log layer moves through tracing
    Log,
    /// One JSON object per line on stdout
    Json,
}

/// Face Daemon - Animated LED matrix face
#[derive(Parser, Debug)]
#[command(name = "face-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "FACE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Tick rate in Hz
    #[arg(long, value_name = "HZ")]
    rate_hz: Option<f64>,

    /// Directory holding the layer bitmaps
    #[arg(long, value_name = "DIR")]
    sprites_dir: Option<PathBuf>,

    /// Stop after this many ticks (at least one)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    ticks: Option<u64>,

    /// Frame output
    #[arg(short = 'o', long, value_enum, default_value_t = Output::Log)]
    output: Output,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "FACE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(seed) = self.seed {
            overrides = overrides.with_seed(seed);
        }
        if let Some(rate) = self.rate_hz {
            overrides = overrides.with_rate_hz(rate);
        }
        if let Some(ref dir) = self.sprites_dir {
            overrides = overrides.with_sprites_dir(dir.clone());
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so JSON frames on stdout stay clean.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("face_daemon={level},face_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Resolve configuration: file, then env, then CLI
fn resolve_config(args: &Args) -> Result<FaceConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;

    info!(
        source = %config.source(),
        file = ?config.config_file_path,
        rate_hz = config.rate_hz,
        seed = ?config.seed,
        sprites_dir = %config.atlas.sprites_dir.display(),
        "Configuration resolved"
    );
    Ok(config)
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Drive the rig until a signal arrives, the tick limit is hit, or a
/// sensor or renderer fails
async fn run(
    config: &FaceConfig,
    renderer: &mut dyn Renderer,
    max_ticks: Option<u64>,
) -> Result<u64> {
    let clock = MonotonicClock::new();
    let sensor_seed = config.seed.unwrap_or_else(rand::random);
    let mut mic = SimulatedMicrophone::new(clock, sensor_seed);
    let mut accel = SimulatedAccelerometer::new(clock, sensor_seed.wrapping_add(1));
    let mut rig = FaceRig::from_config(config, clock.now());

    renderer
        .load_atlas(&config.atlas)
        .context("Failed to load sprite atlas")?;
    renderer
        .render(&rig.initial_frame())
        .context("Failed to draw initial frame")?;

    let schedule = config.schedule();
    info!(
        rate_hz = schedule.rate_hz(),
        period_us = schedule.period().as_micros() as u64,
        "Tick loop starting"
    );

    let mut interval = tokio::time::interval(schedule.period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            received = &mut shutdown => {
                info!(signal = received?, "Received shutdown signal");
                break;
            }
            _ = interval.tick() => {
                let frame = rig
                    .tick(&clock, &mut mic, &mut accel)
                    .with_context(|| format!("Tick {} failed", rig.ticks()))?;
                renderer.render(&frame).context("Failed to render frame")?;

                if max_ticks.is_some_and(|max| rig.ticks() >= max) {
                    info!(ticks = rig.ticks(), "Tick limit reached");
                    break;
                }
            }
        }
    }

    Ok(rig.ticks())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level);

    info!("Face daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    if config.seed.is_none() {
        warn!("No seed configured; this run cannot be replayed");
    }

    let mut renderer: Box<dyn Renderer> = match args.output {
        Output::Log => Box::new(LogRenderer::new()),
        Output::Json => Box::new(JsonLinesRenderer::new(std::io::stdout().lock())),
    };

    match run(&config, renderer.as_mut(), args.ticks).await {
        Ok(ticks) => {
            info!(ticks, "Face daemon stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Face daemon stopped with error");
            Err(e)
        }
    }
}
