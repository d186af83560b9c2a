mod api;
mod cli;
mod config;
mod database;
mod error;
mod listing;
mod query;
mod schema;
mod seed;
mod server;
mod skills;
mod sortable;
mod users;
mod utils;

use cli::Cli;
use config::{Config, CONFIG};
use directories::ProjectDirs;
use error::RosterError;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};
use log::{error, info};

fn main() {
    if let Err(err) = run() {
        error!("Exiting with error: {err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RosterError> {
    let project_dirs = ProjectDirs::from("", "", "roster").ok_or_else(|| {
        RosterError::Error("Could not determine project directories".to_string())
    })?;

    let config = Config::load_config(&project_dirs);
    let logger_spec = config.logging.logger_spec();
    CONFIG
        .set(config)
        .map_err(|_| RosterError::ConfigError("Config already initialized".to_string()))?;

    // Dropping the handle stops the logger
    let _logger = setup_logging(&project_dirs, &logger_spec)?;

    info!("roster {} starting", env!("CARGO_PKG_VERSION"));

    Cli::handle_command_line(project_dirs.data_local_dir().to_path_buf())
}

fn setup_logging(project_dirs: &ProjectDirs, spec: &str) -> Result<LoggerHandle, RosterError> {
    let log_dir = project_dirs.data_local_dir().join("logs");

    Logger::try_with_env_or_str(spec)
        .and_then(|logger| {
            logger
                .log_to_file(FileSpec::default().directory(log_dir).basename("roster"))
                .rotate(
                    Criterion::Size(5 * 1024 * 1024),
                    Naming::Timestamps,
                    Cleanup::KeepLogFiles(10),
                )
                .format(flexi_logger::detailed_format)
                .start()
        })
        .map_err(|e| RosterError::Error(format!("Failed to start logger: {e}")))
}
