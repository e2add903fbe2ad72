//! Stream Recorder - continuous hourly recording of live audio streams.
//!
//! Each configured stream is captured by an external process into one file
//! per wall-clock hour. Files older than the retention window are deleted
//! automatically.

pub mod app;
pub mod capture;
pub mod cli;
pub mod clock;
pub mod config;
pub mod liveness;
pub mod recorder;
pub mod retention;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use utils::AppError;

/// Run the recorder until it is asked to stop
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = config::load_from_file(&cli.config);
    utils::logging::init(config.as_ref().ok().map(|c| c.timezone));

    tracing::info!("Starting Stream Recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{} in {:?}. Exiting...", e, cli.config);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(
        "Loaded configuration from {:?}: {} stream(s), timezone {}",
        cli.config,
        config.streams.len(),
        config.timezone
    );

    let result = tokio::runtime::Runtime::new()
        .map_err(AppError::from)
        .and_then(|runtime| runtime.block_on(app::serve(config)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), "{}", e);
            ExitCode::FAILURE
        }
    }
}
