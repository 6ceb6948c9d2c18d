//! # Plant Server
//!
//! Hosts the bottling plant's two subsystems in one process: the
//! conveyor line and the filler, each with its own registry, process
//! tree and update runner. This binary keeps them alive, logs a
//! periodic status summary and shuts the runners down on Ctrl+C.

use clap::Parser;
use plant_common::config::{ConfigError, ConfigLoader, LogLevel, ServerConfig};
use plant_common::snapshot::{ConveyorSnapshot, FillerSnapshot};
use plant_common::status::ConveyorStatus;
use plant_server::{
    ConveyorLineSubsystem, FILLER_SUBSYSTEM, FillerSubsystem, LINE_SUBSYSTEM, UpdateRunner,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Plant Server: simulated bottling plant process host
#[derive(Parser, Debug)]
#[command(name = "plant_server")]
#[command(version)]
#[command(about = "Hosts the conveyor line and filler subsystems")]
struct Args {
    /// Path to the TOML configuration file (built-in defaults when omitted).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for the simulation RNG (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().compact().init();
            error!("FATAL: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!("Plant server v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Err(e) = run(&args, &config).await {
        error!("FATAL: {e}");
        process::exit(1);
    }
    info!("Plant server shutdown complete");
}

async fn run(args: &Args, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        "🏭 Building subsystems (service={}, conveyors={}, seed={seed})",
        config.shared.service_name, config.line.conveyor_count
    );

    let line = ConveyorLineSubsystem::build(&config.line, seed)?;
    let filler = FillerSubsystem::build(&config.filler, seed.wrapping_add(1))?;

    let line_runner = UpdateRunner::spawn(LINE_SUBSYSTEM, line.tick_interval(), {
        let line = line.clone();
        move || line.tick()
    });
    let filler_runner = UpdateRunner::spawn(FILLER_SUBSYSTEM, filler.tick_interval(), {
        let filler = filler.clone();
        move || filler.tick()
    });
    info!("✅ Subsystems running");

    let mut status_log = interval(Duration::from_secs(10));
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("🛑 Received shutdown signal (Ctrl+C)"),
            Err(err) => error!("Unable to listen for shutdown signal: {err}"),
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = status_log.tick() => {
                info!("📊 {}", line_status(&line.snapshots()));
                info!("📊 {}", filler_status(&filler.snapshot()));
            }
            _ = &mut shutdown => break,
        }
    }

    line_runner.stop();
    filler_runner.stop();
    info!("🏁 Update runners stopped");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and config level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose { "debug" } else { level.as_filter() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

fn line_status(snapshots: &[ConveyorSnapshot]) -> String {
    let running = snapshots
        .iter()
        .filter(|s| s.status == ConveyorStatus::Running)
        .count();
    let alarms = snapshots
        .iter()
        .filter(|s| s.status == ConveyorStatus::Alarm)
        .count();
    let power: f32 = snapshots.iter().map(|s| s.power_kw).sum();
    let bottles: u64 = snapshots.iter().map(|s| u64::from(s.bottle_count)).sum();
    format!(
        "line: running={running}/{} alarms={alarms} power={power:.2}kW bottles={bottles}",
        snapshots.len()
    )
}

fn filler_status(snapshot: &FillerSnapshot) -> String {
    format!(
        "filler: status={} recipe={} power={:.2}kW bottles={}",
        snapshot.status, snapshot.active_recipe, snapshot.power_kw, snapshot.bottle_count
    )
}
