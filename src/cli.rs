use clap::{Parser, Subcommand};
use std::path::PathBuf;

use climate_service::config::{ConfigError, ServiceConfig, DEFAULT_CONFIG_PATH};

#[derive(Debug, Parser)]
#[command(about = "Read-only HTTP API over the Hawaii climate dataset.")]
pub struct Cli {
    /// Configuration file
    #[arg(long, env = "CLIMATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// SQLite dataset, overrides the configuration file
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// Listen address, overrides the configuration file
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// Request worker threads
    #[arg(long)]
    pub workers: Option<usize>,
    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify the dataset, then serve the API (default)
    Serve,
    /// Verify the dataset and print a summary
    Check,
}

impl Cli {
    /// Applies command-line overrides on top of file and environment values.
    pub fn apply(&self, config: &mut ServiceConfig) -> Result<(), ConfigError> {
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.validate()
    }
}
