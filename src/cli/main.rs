use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(version, about = "Command-line client for the Churchen idea API")]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Override the API base URL for this invocation
    #[clap(long, value_parser)]
    pub api_base: Option<String>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the churchen client
    #[clap(subcommand)]
    pub command: Commands,
}
