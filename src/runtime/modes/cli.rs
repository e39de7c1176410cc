//! CLI mode
//!
//! Delegates to the CLI implementation in `interfaces::cli`.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// Run a CLI subcommand
pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(cmd).await
}
