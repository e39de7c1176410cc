//! 广告导出
//!
//! 管理接口下载和 CLI `export` 共用同一份序列化逻辑。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use strum::{EnumString, IntoStaticStr};

use crate::errors::{AdError, Result};
use crate::storage::models::Ad;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        (*self).into()
    }
}

/// CSV 行（扁平化，时间用 RFC3339，空值写空串）
#[derive(Debug, Clone, Serialize)]
pub struct AdCsvRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub ad_type: String,
    pub media_url: String,
    pub google_ads_script: String,
    pub click_url: String,
    pub open_new_tab: bool,
    pub duration: u32,
    pub slot_position: u8,
    pub is_active: bool,
    pub start_date: String,
    pub end_date: String,
    pub impressions_count: u64,
    pub clicks_count: u64,
    pub ctr: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Ad> for AdCsvRow {
    fn from(ad: &Ad) -> Self {
        Self {
            id: ad.id,
            title: ad.title.clone(),
            description: ad.description.clone().unwrap_or_default(),
            ad_type: ad.ad_type().to_string(),
            media_url: ad.creative.media_url().unwrap_or_default().to_string(),
            google_ads_script: ad.creative.script().unwrap_or_default().to_string(),
            click_url: ad.creative.click_url().unwrap_or_default().to_string(),
            open_new_tab: ad.creative.open_new_tab(),
            duration: ad.creative.duration_secs(),
            slot_position: ad.slot.get(),
            is_active: ad.is_active,
            start_date: ad.window.starts_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            end_date: ad.window.ends_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            impressions_count: ad.impressions_count,
            clicks_count: ad.clicks_count,
            ctr: ad.ctr(),
            created_at: ad.created_at.to_rfc3339(),
            updated_at: ad.updated_at.to_rfc3339(),
        }
    }
}

pub fn write_csv<W: Write>(ads: &[Ad], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    for ad in ads {
        csv_writer
            .serialize(AdCsvRow::from(ad))
            .map_err(|e| AdError::export(format!("Failed to write CSV row: {}", e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| AdError::export(format!("Failed to flush CSV: {}", e)))?;
    Ok(())
}

pub fn write_json<W: Write>(ads: &[Ad], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, ads)
        .map_err(|e| AdError::export(format!("Failed to write JSON: {}", e)))
}

/// 序列化到内存（HTTP 下载用）
pub fn render(ads: &[Ad], format: ExportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ExportFormat::Csv => write_csv(ads, &mut buf)?,
        ExportFormat::Json => write_json(ads, &mut buf)?,
    }
    Ok(buf)
}

/// 写入文件（CLI 用）
pub fn export_to_file<P: AsRef<Path>>(ads: &[Ad], format: ExportFormat, path: P) -> Result<()> {
    let file = File::create(path.as_ref())
        .map_err(|e| AdError::file_operation(format!("Failed to create file: {}", e)))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Csv => write_csv(ads, &mut writer)?,
        ExportFormat::Json => write_json(ads, &mut writer)?,
    }
    writer
        .flush()
        .map_err(|e| AdError::file_operation(format!("Failed to flush file: {}", e)))
}

/// 下载文件名，例如 `ads_export_20260314_101500.csv`
pub fn export_filename(format: ExportFormat, now: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "ads_export_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{ActiveWindow, AdCreative, Slot};
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<Ad> {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 10, 15, 0).unwrap();
        vec![
            Ad {
                id: 1,
                title: "Banner, \"quoted\"".into(),
                description: None,
                creative: AdCreative::Image {
                    media_url: "https://cdn.example.com/a.png".into(),
                    click_url: "https://example.com".into(),
                    open_new_tab: true,
                },
                slot: Slot::new(2).unwrap(),
                is_active: true,
                window: ActiveWindow::unbounded(),
                impressions_count: 4,
                clicks_count: 1,
                created_at: ts,
                updated_at: ts,
            },
            Ad {
                id: 2,
                title: "Network".into(),
                description: Some("tag".into()),
                creative: AdCreative::GoogleAds {
                    script: "<script></script>".into(),
                },
                slot: Slot::FIRST,
                is_active: false,
                window: ActiveWindow::unbounded(),
                impressions_count: 0,
                clicks_count: 0,
                created_at: ts,
                updated_at: ts,
            },
        ]
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_extension_outlives_format() {
        let ext: &'static str = {
            let format = ExportFormat::Json;
            format.extension()
        };
        assert_eq!(ext, "json");
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_csv_has_header_and_escapes() {
        let out = String::from_utf8(render(&sample(), ExportFormat::Csv).unwrap()).unwrap();
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,title,description,ad_type"));
        assert!(out.contains("\"Banner, \"\"quoted\"\"\""));
        assert!(out.contains(",25.0,") || out.contains(",25,"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_json_is_array() {
        let out = render(&sample(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["ad_type"], "google_ads");
    }

    #[test]
    fn test_export_filename() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 10, 15, 0).unwrap();
        assert_eq!(
            export_filename(ExportFormat::Json, ts),
            "ads_export_20260314_101500.json"
        );
    }
}
