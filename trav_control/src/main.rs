//! # Traversal Binary
//!
//! Drives a robot around the tile-grid course until the tenth turn.
//!
//! # Usage
//!
//! ```bash
//! # Run against the simulated environment
//! traverse --simulate
//!
//! # Custom config, verbose logging, verify the final position
//! traverse --config config/traverse.toml -s -v --verify
//!
//! # Emit traversal events as JSON lines on stdout
//! traverse -s --events-json
//! ```

#![deny(warnings)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trav_common::config::{ConfigError, LogLevel, TraverseConfig};
use trav_common::consts::DEFAULT_CONFIG_PATH;
use trav_control::{
    JsonLinesReporter, Reporter, Scorecard, TracingReporter, TraversalRunner, verify_completion,
};
use trav_hal::DriverRegistry;
use trav_hal::drivers::simulation::DRIVER_NAME as SIMULATION_DRIVER;

/// Tile-grid traversal controller
#[derive(Parser, Debug)]
#[command(name = "traverse")]
#[command(version)]
#[command(about = "Tile-grid traversal controller with pluggable drivers")]
#[command(long_about = None)]
struct Args {
    /// Path to traverse.toml. Defaults apply when the file is missing.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// Driver to load by name
    #[arg(short, long, default_value = SIMULATION_DRIVER)]
    driver: String,

    /// List registered drivers and exit
    #[arg(long)]
    list_drivers: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Write traversal events as JSON lines to stdout
    #[arg(long)]
    events_json: bool,

    /// Check turn count and final position after the run; exit 1 on failure
    #[arg(long)]
    verify: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Traversal failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args).inspect_err(|e| eprintln!("Config error: {e}"))?;

    setup_tracing(&args, config.shared.log_level);
    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let registry = DriverRegistry::with_builtin_drivers();
    if args.list_drivers {
        for name in registry.list_drivers() {
            println!("{name}");
        }
        return Ok(());
    }

    let driver_name = if args.simulate {
        info!("Simulation mode enabled");
        SIMULATION_DRIVER
    } else {
        args.driver.as_str()
    };
    let driver = registry.create_driver(driver_name)?;

    let reporter: Arc<dyn Reporter> = if args.events_json {
        Arc::new(JsonLinesReporter::new(std::io::stdout()))
    } else {
        Arc::new(TracingReporter)
    };

    let mut runner = TraversalRunner::new(driver, reporter, &config)?;

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let stats = runner.run()?;
    info!(
        "Run stats: ticks={}, alignments={}, turns={}, max_tick={:?}, elapsed={:?}",
        stats.ticks, stats.alignments, stats.turns, stats.max_tick, stats.elapsed
    );

    if args.verify {
        let controller = runner.controller();
        let mut card = Scorecard::new();
        let driver = controller.driver();
        verify_completion(
            &mut card,
            controller.course(),
            &driver.read_all(),
            driver.last_command(),
        );
        info!("Verification: {} passed, {} failed", card.passed(), card.failed());
        if !card.all_passed() {
            return Err("verification failed".into());
        }
    }

    info!("Traversal complete");
    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(args: &Args) -> Result<TraverseConfig, ConfigError> {
    match TraverseConfig::load_validated(&args.config) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound) => {
            // Tracing is not up yet.
            eprintln!(
                "No config at {}, using defaults",
                args.config.display()
            );
            let config = TraverseConfig::default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

/// Setup tracing subscriber based on CLI arguments and config.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        log_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    // Keep stdout clean for --events-json.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if args.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
