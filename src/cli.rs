//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Record live audio streams into hourly files
#[derive(Debug, Parser)]
#[command(name = "stream-recorder", version, about)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(
        short,
        long,
        env = "STREAM_RECORDER_CONFIG",
        default_value = "config.json"
    )]
    pub config: PathBuf,
}
