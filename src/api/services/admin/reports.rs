//! Admin API 汇总、统计与导出

use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use chrono::Utc;

use crate::errors::AdError;
use crate::services::export::export_filename;
use crate::services::{AdsServices, ExportFormat, parse_filter};

use super::helpers::{api_result, error_from_ad};
use super::types::{AnalyticsQuery, ExportQuery};

/// 按广告位分组；每组标出当前实际投放的广告
pub async fn ads_by_slot(services: web::Data<AdsServices>) -> HttpResponse {
    api_result(services.ads.grouped_by_slot().await, "OK")
}

pub async fn dashboard(services: web::Data<AdsServices>) -> HttpResponse {
    api_result(services.ads.dashboard().await, "OK")
}

pub async fn ad_analytics(
    path: web::Path<i64>,
    query: web::Query<AnalyticsQuery>,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    api_result(
        services.ads.analytics(path.into_inner(), query.days).await,
        "OK",
    )
}

/// 以附件形式下载，默认 CSV
pub async fn export_ads(
    query: web::Query<ExportQuery>,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let format = match query.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        None => ExportFormat::default(),
        Some(raw) => match raw.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(_) => {
                return error_from_ad(&AdError::validation(
                    "format",
                    "format must be csv or json",
                ));
            }
        },
    };

    let filter = match parse_filter(
        query.status.as_deref(),
        query.ad_type.as_deref(),
        query.slot.as_deref(),
        query.search.as_deref(),
    ) {
        Ok(filter) => filter,
        Err(e) => return error_from_ad(&e),
    };

    match services.ads.export(&filter, format).await {
        Ok(body) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, format.content_type()))
            .insert_header((
                CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    export_filename(format, Utc::now())
                ),
            ))
            .body(body),
        Err(e) => error_from_ad(&e),
    }
}
