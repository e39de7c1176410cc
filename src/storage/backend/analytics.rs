//! Per-ad analytics queries
//!
//! Buckets impression and click rows by UTC day using a backend-specific
//! date expression, then fills missing days with zeros.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};

use super::SeaOrmStorage;
use crate::errors::{AdError, Result};
use crate::storage::models::{AdAnalytics, AnalyticsTotals, DailyBucket, click_through_rate};

use migration::entities::{ad_click, ad_impression};

/// 默认统计天数
pub const DEFAULT_ANALYTICS_DAYS: u32 = 30;
/// 最大统计天数
pub const MAX_ANALYTICS_DAYS: u32 = 365;

#[derive(Debug, FromQueryResult)]
struct DayCountRow {
    label: String,
    count: i64,
}

/// 按 UTC 日分组的 SQL 片段（YYYY-MM-DD），与会话时区无关
fn day_sql(backend: DbBackend) -> &'static str {
    match backend {
        // SQLite 以 RFC3339 文本存储，strftime 会先换算到 UTC
        DbBackend::Sqlite => "strftime('%Y-%m-%d', created_at)",
        DbBackend::MySql => {
            "DATE_FORMAT(CONVERT_TZ(created_at, @@session.time_zone, '+00:00'), '%Y-%m-%d')"
        }
        _ => "TO_CHAR(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
    }
}

fn day_expr(backend: DbBackend) -> Expr {
    Expr::cust(day_sql(backend))
}

/// 收敛统计天数到 1..=MAX_ANALYTICS_DAYS，None 取默认值
pub fn clamp_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_ANALYTICS_DAYS)
        .clamp(1, MAX_ANALYTICS_DAYS)
}

/// 把稀疏的按天计数补齐成连续序列（旧 → 新），长度恒为 days
fn fill_days(
    today: NaiveDate,
    days: u32,
    impressions: &HashMap<NaiveDate, u64>,
    clicks: &HashMap<NaiveDate, u64>,
) -> Vec<DailyBucket> {
    (0..days as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let imp = impressions.get(&date).copied().unwrap_or(0);
            let clk = clicks.get(&date).copied().unwrap_or(0);
            DailyBucket {
                date,
                impressions: imp,
                clicks: clk,
                ctr: click_through_rate(clk, imp),
            }
        })
        .collect()
}

fn rows_to_map(rows: Vec<DayCountRow>) -> HashMap<NaiveDate, u64> {
    rows.into_iter()
        .filter_map(|row| {
            NaiveDate::parse_from_str(&row.label, "%Y-%m-%d")
                .ok()
                .map(|date| (date, row.count.max(0) as u64))
        })
        .collect()
}

impl SeaOrmStorage {
    /// 单个广告最近 days 天的曝光 / 点击趋势；广告不存在时返回 None
    pub async fn ad_analytics(
        &self,
        id: i64,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<AdAnalytics>> {
        let Some(ad) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let days = days.clamp(1, MAX_ANALYTICS_DAYS);
        let today = now.date_naive();
        let first_day = today - Duration::days(days as i64 - 1);
        let start = first_day
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        let date_expr = day_expr(self.db_backend());
        let map_err =
            |e: sea_orm::DbErr| AdError::database_operation(format!("趋势查询失败: {}", e));

        let impression_rows = ad_impression::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(ad_impression::Column::Id.count(), "count")
            .filter(ad_impression::Column::AdId.eq(id))
            .filter(ad_impression::Column::CreatedAt.gte(start))
            .filter(ad_impression::Column::CreatedAt.lte(now))
            .group_by(date_expr.clone())
            .order_by_asc(Expr::cust("label"))
            .into_model::<DayCountRow>()
            .all(&self.db)
            .await
            .map_err(map_err)?;

        let click_rows = ad_click::Entity::find()
            .select_only()
            .column_as(date_expr.clone(), "label")
            .column_as(ad_click::Column::Id.count(), "count")
            .filter(ad_click::Column::AdId.eq(id))
            .filter(ad_click::Column::CreatedAt.gte(start))
            .filter(ad_click::Column::CreatedAt.lte(now))
            .group_by(date_expr)
            .order_by_asc(Expr::cust("label"))
            .into_model::<DayCountRow>()
            .all(&self.db)
            .await
            .map_err(map_err)?;

        let impressions = rows_to_map(impression_rows);
        let clicks = rows_to_map(click_rows);
        let daily = fill_days(today, days, &impressions, &clicks);

        let window_impressions = daily.iter().map(|b| b.impressions).sum();
        let window_clicks = daily.iter().map(|b| b.clicks).sum();

        Ok(Some(AdAnalytics {
            ad_id: ad.id,
            title: ad.title.clone(),
            days,
            window: AnalyticsTotals::new(window_impressions, window_clicks),
            lifetime: AnalyticsTotals::new(ad.impressions_count, ad.clicks_count),
            daily,
        }))
    }
}
