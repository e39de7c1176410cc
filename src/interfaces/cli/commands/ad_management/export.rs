//! Export command

use chrono::Utc;
use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::export::{export_filename, export_to_file};
use crate::services::{AdService, ExportFormat};
use crate::storage::models::AdFilter;

pub async fn export_ads(
    service: &AdService,
    format: String,
    file_path: Option<String>,
) -> Result<(), CliError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|_| CliError::ParseError(format!("Unsupported export format: {}", format)))?;

    let ads = service
        .storage()
        .load_all_filtered(&AdFilter::default())
        .await
        .map_err(|e| CliError::CommandError(format!("Failed to load ads: {}", e)))?;

    let path = file_path.unwrap_or_else(|| export_filename(format, Utc::now()));
    export_to_file(&ads, format, &path)?;

    println!(
        "{} Exported {} ads to {}",
        "✓".bold().green(),
        ads.len().to_string().green(),
        path.blue()
    );
    Ok(())
}
