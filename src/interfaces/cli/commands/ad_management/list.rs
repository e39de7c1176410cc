//! List ads command

use chrono::Utc;
use colored::Colorize;

use super::helpers::status_badge;
use crate::interfaces::cli::CliError;
use crate::services::{AdService, parse_filter};

pub async fn list_ads(
    service: &AdService,
    slot: Option<String>,
    status: Option<String>,
    ad_type: Option<String>,
) -> Result<(), CliError> {
    let filter = parse_filter(status.as_deref(), ad_type.as_deref(), slot.as_deref(), None)?;
    let ads = service
        .storage()
        .load_all_filtered(&filter)
        .await
        .map_err(|e| CliError::CommandError(format!("Failed to load ads: {}", e)))?;

    if ads.is_empty() {
        println!("{} No ads found", "ℹ".bold().blue());
        return Ok(());
    }

    let now = Utc::now();
    println!("{}", "Ad list:".bold().green());
    println!();
    for ad in &ads {
        println!(
            "  {} {} {} {} {}",
            format!("#{}", ad.id).cyan(),
            ad.title.bold(),
            format!("[slot {} · {}]", ad.slot, ad.ad_type()).dimmed(),
            status_badge(ad, now),
            format!(
                "({} impressions, {} clicks, {:.2}% CTR)",
                ad.impressions_count,
                ad.clicks_count,
                ad.ctr()
            )
            .dimmed()
        );
    }
    println!();
    println!(
        "{} Total {} ads",
        "ℹ".bold().blue(),
        ads.len().to_string().green()
    );
    Ok(())
}
