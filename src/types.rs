//! Core shared types for the churchen client.
//!
//! This module contains the crate-wide Result alias and the CLI command
//! structure.

use std::path::PathBuf;

use clap::Subcommand;

use crate::ChurnError;

/// A specialized Result type for churchen operations.
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Available subcommands for the churchen client
#[derive(Subcommand)]
pub enum Commands {
    /// Submit an idea for matching and an AI answer
    Churn {
        /// Idea text
        text: Option<String>,

        /// Tags to attach to the idea (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Path to a file containing the idea text
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Publish the idea from the last successful submission
    Publish {
        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Fetch the public JSON record of an idea
    Open {
        /// Idea ID (defaults to the last published or submitted idea)
        id: Option<String>,
    },

    /// Browse the public feed of published ideas
    Feed {
        /// Limit the number of feed items returned (default from config)
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show the most recent matches across submissions
    Live {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show the local token balance
    Balance,

    /// Credit demo tokens to the local balance
    Topup {
        /// Amount of tokens to credit
        #[clap(default_value_t = 5.0)]
        amount: f64,
    },

    /// Check that the API is reachable
    Health,

    /// Send an idea draft to the drafts ingest host
    Draft {
        /// Draft text
        text: Option<String>,

        /// Tags to attach to the draft (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Path to a file containing the draft text
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// Clear the saved submission session (keeps the token ledger)
    Clear,

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
