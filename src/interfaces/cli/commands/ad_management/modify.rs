//! Toggle and delete commands

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::AdService;

/// `target` 为 None 时翻转当前状态，否则直接设置
pub async fn toggle_ad(
    service: &AdService,
    id: i64,
    target: Option<bool>,
) -> Result<(), CliError> {
    let ad = match target {
        Some(is_active) => service.set_active(id, is_active).await?,
        None => service.toggle(id).await?,
    };
    let state = if ad.is_active {
        "active".green()
    } else {
        "inactive".yellow()
    };
    println!(
        "{} Ad {} is now {}",
        "✓".bold().green(),
        format!("#{}", ad.id).cyan(),
        state
    );
    Ok(())
}

pub async fn delete_ad(service: &AdService, id: i64) -> Result<(), CliError> {
    service.delete(id).await?;
    println!(
        "{} Deleted ad {} with its impressions and clicks",
        "✓".bold().green(),
        format!("#{}", id).cyan()
    );
    Ok(())
}
