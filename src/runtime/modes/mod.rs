//! Mode routing
//!
//! This module provides unified entry points for different execution modes:
//! - Server mode (HTTP server)
//! - CLI mode (one-shot admin and cron commands)
//!
//! The mode selection is based on the parsed command line and feature flags.

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;

use crate::cli::Commands;

/// Mode detection result
#[derive(Debug, PartialEq)]
pub enum Mode {
    #[cfg(feature = "server")]
    Server,
    #[cfg(feature = "cli")]
    Cli,
    Unknown,
}

/// Detect which mode to run based on the parsed subcommand
///
/// # Mode Detection Logic
/// 1. No subcommand or `serve` and server feature is enabled -> Server mode
/// 2. Any other subcommand and CLI feature is enabled -> CLI mode
/// 3. Otherwise -> Unknown
pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => {
            #[cfg(feature = "server")]
            return Mode::Server;
            #[cfg(not(feature = "server"))]
            return Mode::Unknown;
        }
        Some(_) => {
            #[cfg(feature = "cli")]
            return Mode::Cli;
            #[cfg(not(feature = "cli"))]
            return Mode::Unknown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mode() {
        assert_eq!(detect_mode(None), Mode::Server);
        assert_eq!(detect_mode(Some(&Commands::Serve)), Mode::Server);
        assert_eq!(detect_mode(Some(&Commands::SendBatch)), Mode::Cli);
    }
}
