//! # Plant Aggregator
//!
//! Runs the whole bottling plant in one process: both subsystems with
//! their update runners, loopback links, discovery, plant power-on and
//! a periodic poll-and-aggregate cycle logging the plant overview.

use clap::Parser;
use plant_aggregator::{
    AggregationEngine, ConveyorPoller, Discovery, FillerPoller, PlantController,
};
use plant_common::config::{AggregatorConfig, ConfigError, ConfigLoader, LogLevel, ServerConfig};
use plant_registry::{LoopbackLink, SubsystemLink};
use plant_server::{
    ConveyorLineSubsystem, FILLER_SUBSYSTEM, FillerSubsystem, LINE_SUBSYSTEM, UpdateRunner,
};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Plant Aggregator: plant-wide discovery, polling and control
#[derive(Parser, Debug)]
#[command(name = "plant_aggregator")]
#[command(version)]
#[command(about = "Aggregates the bottling plant into one overview per cycle")]
struct Args {
    /// Path to the TOML configuration file (built-in defaults when omitted).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for the simulation RNG (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many aggregation cycles (0 = run until Ctrl+C).
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Emit the overview as one JSON line per cycle on stdout.
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,
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

    info!("Plant aggregator v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Err(e) = run(&args, &config).await {
        error!("FATAL: {e}");
        process::exit(1);
    }
    info!("Plant aggregator shutdown complete");
}

async fn run(args: &Args, config: &AggregatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let server_config = load_server_config(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        "🏭 Building the in-process plant (service={}, conveyors={}, seed={seed})",
        config.shared.service_name, server_config.line.conveyor_count
    );

    let line = ConveyorLineSubsystem::build(&server_config.line, seed)?;
    let filler = FillerSubsystem::build(&server_config.filler, seed.wrapping_add(1))?;

    let line_runner = UpdateRunner::spawn(LINE_SUBSYSTEM, line.tick_interval(), {
        let line = line.clone();
        move || line.tick()
    });
    let filler_runner = UpdateRunner::spawn(FILLER_SUBSYSTEM, filler.tick_interval(), {
        let filler = filler.clone();
        move || filler.tick()
    });

    let line_link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(line.service()));
    let filler_link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(filler.service()));

    let mut line_discovery = Discovery::new();
    let mut filler_discovery = Discovery::new();
    let line_vars = line_discovery.walk(line_link.as_ref(), config.poll.max_browse_depth)?;
    let filler_vars = filler_discovery.walk(filler_link.as_ref(), config.poll.max_browse_depth)?;
    info!("📡 Discovery complete ({line_vars} line vars, {filler_vars} filler vars)");

    let line_resolver = line_discovery.resolver();
    let filler_resolver = filler_discovery.resolver();
    let conveyor_poller = ConveyorPoller::new(line_link.clone(), &line_resolver)?;
    let filler_poller = FillerPoller::new(filler_link.clone(), &filler_resolver)?;
    let controller = PlantController::new(
        line_link.clone(),
        &line_resolver,
        filler_link.clone(),
        &filler_resolver,
    )?;
    power_on(&controller)?;

    let engine = AggregationEngine::new(config.poll.counter_tolerance);
    let mut poll_cycle = interval(Duration::from_millis(config.poll.interval_ms));
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("🛑 Received shutdown signal (Ctrl+C)"),
            Err(err) => error!("Unable to listen for shutdown signal: {err}"),
        }
    };
    tokio::pin!(shutdown);

    info!(
        "📊 Aggregation loop started (interval={}ms, cycles={})",
        config.poll.interval_ms, args.cycles
    );
    let mut completed: u64 = 0;
    loop {
        tokio::select! {
            _ = poll_cycle.tick() => {
                let overview = engine.aggregate(conveyor_poller.poll(), filler_poller.poll());
                info!("📊 {overview}");
                if args.json {
                    match serde_json::to_string(&overview) {
                        Ok(json_line) => println!("{json_line}"),
                        Err(err) => warn!("Overview serialization failed: {err}"),
                    }
                }
                completed += 1;
                if args.cycles > 0 && completed >= args.cycles {
                    info!("🏁 Requested cycle count reached ({completed})");
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    line_runner.stop();
    filler_runner.stop();
    info!("🏁 Update runners stopped");
    Ok(())
}

fn power_on(controller: &PlantController) -> Result<(), Box<dyn std::error::Error>> {
    let statuses = controller.set_all_conveyors(true)?;
    let rejected = statuses.iter().filter(|s| !s.is_good()).count();
    if rejected > 0 {
        warn!("⚠️ {rejected} conveyors rejected the power-on command");
    }
    let status = controller.set_filler_power(true)?;
    if !status.is_good() {
        warn!("⚠️ Filler rejected the power-on command ({status})");
    }
    info!("⚡ Plant powered on ({} conveyors + filler)", statuses.len());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AggregatorConfig, ConfigError> {
    let config = match path {
        Some(path) => AggregatorConfig::load(path)?,
        None => AggregatorConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// The demo hosts the subsystems in-process, so the same TOML file may
/// carry `[line]`/`[filler]` sections; absent sections fall back to the
/// reference plant defaults.
fn load_server_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and config level.
///
/// With `--json` the overview stream owns stdout, so logs move to
/// stderr.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose { "debug" } else { level.as_filter() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
