//! Show ad and dashboard commands

use chrono::Utc;
use colored::Colorize;

use super::helpers::{format_time, status_badge};
use crate::interfaces::cli::CliError;
use crate::services::AdService;

pub async fn show_ad(service: &AdService, id: i64) -> Result<(), CliError> {
    let ad = service.get(id).await?;
    let now = Utc::now();

    println!(
        "{} {} {}",
        format!("#{}", ad.id).cyan(),
        ad.title.bold(),
        status_badge(&ad, now)
    );
    if let Some(description) = &ad.description {
        println!("  {}", description.dimmed());
    }
    println!("  {:<12} {}", "type:", ad.ad_type());
    println!("  {:<12} {}", "slot:", ad.slot);
    if let Some(media) = ad.creative.media_url() {
        println!("  {:<12} {}", "media:", media.blue());
    }
    if let Some(click_url) = ad.creative.click_url() {
        println!(
            "  {:<12} {} {}",
            "click:",
            click_url.blue().underline(),
            if ad.creative.open_new_tab() {
                "(new tab)".dimmed()
            } else {
                "".normal()
            }
        );
    }
    if ad.creative.script().is_some() {
        println!("  {:<12} {}", "script:", "external network tag".dimmed());
    }
    println!(
        "  {:<12} {} → {}",
        "window:",
        format_time(ad.window.starts_at),
        format_time(ad.window.ends_at)
    );
    println!(
        "  {:<12} {} impressions, {} clicks, {:.2}% CTR",
        "stats:",
        ad.impressions_count.to_string().green(),
        ad.clicks_count.to_string().green(),
        ad.ctr()
    );
    Ok(())
}

pub async fn show_stats(service: &AdService) -> Result<(), CliError> {
    let summary = service.dashboard().await?;

    println!("{}", "Ad dashboard:".bold().green());
    println!(
        "  {:<14} {} ({} active, {} inactive, {} live now)",
        "ads:",
        summary.total_ads.to_string().bold(),
        summary.active_ads,
        summary.inactive_ads,
        summary.live_ads
    );
    for (ad_type, count) in &summary.ads_by_type {
        println!("  {:<14} {}", format!("{}:", ad_type), count);
    }
    println!(
        "  {:<14} {}",
        "impressions:",
        summary.total_impressions.to_string().green()
    );
    println!(
        "  {:<14} {}",
        "clicks:",
        summary.total_clicks.to_string().green()
    );
    println!("  {:<14} {:.2}%", "ctr:", summary.ctr);
    Ok(())
}
