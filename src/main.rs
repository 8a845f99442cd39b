//! Climate Service - HTTP API
//!
//! Serves precipitation, station and temperature statistics from a
//! read-only SQLite copy of the Hawaii climate dataset.
//!
//! Usage:
//!   cargo run --release                         # serve on the configured address
//!   cargo run --release -- --port 8080 serve    # serve on another port
//!   cargo run --release -- check                # verify the dataset and exit
//!
//! Environment:
//!   CLIMATE_CONFIG, CLIMATE_DATABASE, CLIMATE_BIND, CLIMATE_PORT,
//!   CLIMATE_WORKERS, CLIMATE_TOBS_STATION, RUST_LOG

use clap::Parser;
use climate_service::config::{self, ServiceConfig};
use climate_service::{db, endpoint, queries};
use std::error::Error;
use std::process;

use cli::{Cli, Command};

mod cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Cli) -> Result<(), Box<dyn Error>> {
    let mut config = config::load_config(&args.config)?;
    args.apply(&mut config)?;

    log::info!(
        "database={} listen={} workers={} query_timeout={}ms tobs_station={}",
        config.database_path.display(),
        config.listen_addr(),
        config.workers,
        config.query_timeout_ms,
        config.tobs_station
    );

    match args.cmd.as_ref().unwrap_or(&Command::Serve) {
        Command::Serve => serve(config),
        Command::Check => check(&config),
    }
}

fn serve(config: ServiceConfig) -> Result<(), Box<dyn Error>> {
    {
        let (_session, tables) = db::connect_and_verify(&config.database_path, config.query_timeout())?;
        log::info!("Dataset tables: {:?}", tables);
    }

    endpoint::start_endpoint_server(config)?;
    Ok(())
}

fn check(config: &ServiceConfig) -> Result<(), Box<dyn Error>> {
    let (session, tables) = db::connect_and_verify(&config.database_path, config.query_timeout())?;
    let summary = queries::dataset_summary(&session)?;

    println!("Dataset: {}", config.database_path.display());
    println!("  tables:       {}", tables.join(", "));
    println!("  stations:     {}", summary.stations);
    println!("  measurements: {}", summary.measurements);
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => println!("  date range:   {} .. {}", first, last),
        _ => println!("  date range:   (no measurements)"),
    }
    Ok(())
}
