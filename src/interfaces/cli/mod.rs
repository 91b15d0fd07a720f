//! CLI interface module
//!
//! This module provides command-line interface functionality for shoptrack.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::runtime::lifetime::startup::build_services;
use commands::{
    config_generate, create_admin, import_emails, promote_user, run_campaign_command, send_batch,
};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::ShoptrackError> for CliError {
    fn from(err: crate::errors::ShoptrackError) -> Self {
        match err {
            crate::errors::ShoptrackError::DatabaseConfig(_)
            | crate::errors::ShoptrackError::DatabaseConnection(_)
            | crate::errors::ShoptrackError::DatabaseOperation(_) => {
                CliError::StorageError(err.to_string())
            }
            crate::errors::ShoptrackError::Validation(_) => CliError::ParseError(err.to_string()),
            _ => CliError::CommandError(err.to_string()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need DB connection, handle it separately
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let services = build_services()
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;

    match cmd {
        Commands::SendBatch => send_batch(&services).await,

        Commands::Campaign { action } => run_campaign_command(&services, action).await,

        Commands::ImportEmails { file } => import_emails(&services, &file).await,

        Commands::CreateAdmin {
            username,
            email,
            password,
            stdin,
        } => create_admin(&services, &username, &email, password, stdin).await,

        Commands::Promote { email } => promote_user(&services, &email).await,

        Commands::Serve | Commands::Config { .. } => Err(CliError::CommandError(
            "command is not handled by the CLI dispatcher".to_string(),
        )),
    }
}
