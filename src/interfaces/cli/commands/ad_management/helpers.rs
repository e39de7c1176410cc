use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::storage::models::Ad;

pub fn status_badge(ad: &Ad, now: DateTime<Utc>) -> ColoredString {
    if !ad.is_active {
        "inactive".dimmed()
    } else if ad.window.contains(now) {
        "live".green().bold()
    } else {
        "scheduled".yellow()
    }
}

pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
