//! # Lift Simulator Binary
//!
//! Runs the lift simulator on the simulator port until interrupted or until
//! the car leaves the shaft.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 4 floors on port 15657
//! lift_sim
//!
//! # From a config file, overriding the floor count
//! lift_sim --config config/lift.toml --floors 6
//!
//! # Verbose logging as JSON
//! lift_sim -v --json
//! ```

use clap::Parser;
use crossbeam_channel::{bounded, select};
use lift_common::config::SharedConfig;
use lift_common::hal::config::{SimConfig, SimFileConfig};
use lift_hal::server::SimServer;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Lift simulator - plays an elevator car over the 4-byte lift protocol
#[derive(Parser, Debug)]
#[command(name = "lift_sim")]
#[command(version)]
#[command(about = "Elevator simulator speaking the lift wire protocol")]
#[command(long_about = None)]
struct Args {
    /// Path to a simulator configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of floors (2-9), overrides the config file
    #[arg(short, long)]
    floors: Option<u8>,

    /// Floor the car starts at, overrides the config file
    #[arg(long)]
    start_floor: Option<u8>,

    /// TCP port to listen on, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Lift simulator failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loaded = load_config(&args);

    let level = match &loaded {
        Ok((shared, _)) if !args.verbose => shared.log_level.into(),
        _ if args.verbose => Level::DEBUG,
        _ => Level::INFO,
    };
    setup_tracing(level, args.json);

    let (shared, config) = loaded?;
    info!(
        "{} v{} starting ({} floors, port {})",
        shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.num_floors,
        config.com_port
    );

    let handle = SimServer::bind(config)?.start()?;
    let faults = handle.faults().clone();

    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        let _ = stop_tx.try_send(());
    })?;

    select! {
        recv(faults) -> fault => {
            if let Ok(fault) = fault {
                error!("Simulation stopped: {}", fault);
                handle.shutdown();
                return Err(fault.into());
            }
        }
        recv(stop_rx) -> _ => {}
    }

    handle.shutdown();
    info!("Lift simulator shutdown complete");
    Ok(())
}

/// Load the config file (if any) and apply command line overrides.
fn load_config(args: &Args) -> Result<(SharedConfig, SimConfig), Box<dyn std::error::Error>> {
    let (shared, config) = match &args.config {
        Some(path) => SimFileConfig::load_validated(path)?,
        None => (SharedConfig::default(), SimConfig::default()),
    };

    let mut builder = config.into_builder();
    if let Some(floors) = args.floors {
        builder = builder.num_floors(floors)?;
    }
    if let Some(start_floor) = args.start_floor {
        builder = builder.start_floor(start_floor)?;
    }
    if let Some(port) = args.port {
        builder = builder.com_port(port)?;
    }
    Ok((shared, builder.build()?))
}

/// Setup tracing subscriber.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
