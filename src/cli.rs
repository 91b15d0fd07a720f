//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for shoptrack using clap's derive macros.

use clap::{Parser, Subcommand};

/// shoptrack - storefront backend with email campaigns and tracked links
#[derive(Parser)]
#[command(name = "shoptrack")]
#[command(version)]
#[command(about = "Storefront backend with email campaigns and click-tracked links", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (same as running without a command)
    Serve,

    /// Send to the next pending mailing-list address (for cron)
    SendBatch,

    /// Inspect or control the mailing campaign
    Campaign {
        #[command(subcommand)]
        action: CampaignCommands,
    },

    /// Import addresses into the mailing list
    ImportEmails {
        /// File with one address per line (`-` for stdin)
        file: String,
    },

    /// Create a verified administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Grant admin rights to an existing account
    Promote {
        /// Account email
        email: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Campaign control commands
#[derive(Subcommand)]
pub enum CampaignCommands {
    /// Set the campaign to Running
    Start,

    /// Set the campaign to Paused
    Pause,

    /// Show state, interval and per-status counts
    Status,

    /// Set the send interval in minutes
    Interval {
        /// Minutes between two sends (>= 1)
        minutes: u64,
    },

    /// Move Failed rows back to Pending
    ResetFailed,
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
