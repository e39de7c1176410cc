//! CLI interface module
//!
//! Administrative commands that work directly on the database, without a
//! running server.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::get_config;
use crate::runtime::lifetime::startup::prepare_cli_storage;
use crate::services::AdService;
use commands::{config_generate, delete_ad, export_ads, list_ads, show_ad, show_stats, toggle_ad};

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

impl From<crate::errors::AdError> for CliError {
    fn from(err: crate::errors::AdError) -> Self {
        match err {
            crate::errors::AdError::Validation { .. } => CliError::ParseError(err.to_string()),
            crate::errors::AdError::NotFound(msg) => CliError::CommandError(msg),
            other => CliError::StorageError(other.to_string()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need a DB connection
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let config = get_config();
    let storage = prepare_cli_storage(&config)
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    let service = AdService::new(storage.clone());

    let result = match cmd {
        Commands::List {
            slot,
            status,
            ad_type,
        } => list_ads(&service, slot, status, ad_type).await,
        Commands::Show { id } => show_ad(&service, id).await,
        Commands::Toggle { id, on, off } => {
            let target = match (on, off) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            toggle_ad(&service, id, target).await
        }
        Commands::Delete { id } => delete_ad(&service, id).await,
        Commands::Stats => show_stats(&service).await,
        Commands::Export { format, file_path } => export_ads(&service, format, file_path).await,
        Commands::Serve | Commands::Config { .. } => Err(CliError::CommandError(
            "command is not handled by the CLI".to_string(),
        )),
    };

    if let Err(e) = storage.close().await {
        tracing::debug!("Failed to close CLI storage: {}", e);
    }
    result
}
