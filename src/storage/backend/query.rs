//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations on `ads`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, sea_query::Expr,
};
use tracing::{debug, warn};

use super::converters::model_to_ad;
use super::{SeaOrmStorage, retry};
use crate::errors::{AdError, Result};
use crate::storage::models::{Ad, AdFilter, AdStatus, DashboardSummary, Slot, click_through_rate};

use migration::entities::ad;

/// 每页最大条数
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, FromQueryResult)]
struct CounterTotals {
    total_impressions: i64,
    total_clicks: i64,
}

#[derive(Debug, FromQueryResult)]
struct TypeCountRow {
    ad_type: String,
    count: i64,
}

/// 当前可投放：启用，且 now 落在 [start_date, end_date] 内（空值不限）
pub(super) fn live_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(ad::Column::IsActive.eq(true))
        .add(
            Condition::any()
                .add(ad::Column::StartDate.is_null())
                .add(ad::Column::StartDate.lte(now)),
        )
        .add(
            Condition::any()
                .add(ad::Column::EndDate.is_null())
                .add(ad::Column::EndDate.gte(now)),
        )
}

fn filter_condition(filter: &AdFilter) -> Condition {
    let mut condition = Condition::all();

    match filter.status {
        Some(AdStatus::Active) => condition = condition.add(ad::Column::IsActive.eq(true)),
        Some(AdStatus::Inactive) => condition = condition.add(ad::Column::IsActive.eq(false)),
        None => {}
    }

    if let Some(ad_type) = filter.ad_type {
        condition = condition.add(ad::Column::AdType.eq(ad_type.as_ref()));
    }

    if let Some(slot) = filter.slot {
        condition = condition.add(ad::Column::SlotPosition.eq(slot.get() as i32));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(ad::Column::Title.contains(search))
                .add(ad::Column::Description.contains(search)),
        );
    }

    condition
}

/// 新的在前；created_at 相同按 id 倒序
fn newest_first(select: Select<ad::Entity>) -> Select<ad::Entity> {
    select
        .order_by_desc(ad::Column::CreatedAt)
        .order_by_desc(ad::Column::Id)
}

/// 跨数据库的 SUM，结果统一为 BIGINT（MySQL / PostgreSQL 对 BIGINT 求和会得到 DECIMAL / NUMERIC）
pub(super) fn bigint_sum(backend: DbBackend, inner: &str) -> Expr {
    match backend {
        DbBackend::MySql => Expr::cust(format!("CAST(COALESCE(SUM({}), 0) AS SIGNED)", inner)),
        DbBackend::Postgres => Expr::cust(format!("CAST(COALESCE(SUM({}), 0) AS BIGINT)", inner)),
        _ => Expr::cust(format!("COALESCE(SUM({}), 0)", inner)),
    }
}

impl SeaOrmStorage {
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Ad>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("find_by_id({})", id), self.retry_config, || async {
            ad::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| AdError::database_operation(format!("查询广告失败: {}", e)))?;

        Ok(model.map(model_to_ad))
    }

    /// 获取广告位当前投放的广告（最新创建者胜出）
    pub async fn find_active_by_slot(&self, slot: Slot, now: DateTime<Utc>) -> Result<Option<Ad>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_active_by_slot({})", slot),
            self.retry_config,
            || async {
                newest_first(
                    ad::Entity::find()
                        .filter(live_condition(now))
                        .filter(ad::Column::SlotPosition.eq(slot.get() as i32)),
                )
                .one(db)
                .await
            },
        )
        .await
        .map_err(|e| AdError::database_operation(format!("查询投放广告失败: {}", e)))?;

        Ok(model.map(model_to_ad))
    }

    /// 带过滤条件的分页加载，返回（当前页，总数）
    ///
    /// page 从 1 开始；page_size 收敛到 1..=MAX_PAGE_SIZE
    pub async fn list_paginated(
        &self,
        filter: &AdFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Ad>, u64)> {
        let db = &self.db;
        let condition = filter_condition(filter);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let page_offset = page.max(1) - 1;

        let total = retry::with_retry("list_paginated(count)", self.retry_config, || async {
            ad::Entity::find()
                .filter(condition.clone())
                .count(db)
                .await
        })
        .await
        .map_err(|e| AdError::database_operation(format!("统计广告数量失败: {}", e)))?;

        let models = retry::with_retry("list_paginated(data)", self.retry_config, || async {
            newest_first(ad::Entity::find().filter(condition.clone()))
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await
        .map_err(|e| AdError::database_operation(format!("分页查询失败: {}", e)))?;

        Ok((models.into_iter().map(model_to_ad).collect(), total))
    }

    /// 带过滤条件加载所有广告（不分页，用于导出）
    pub async fn load_all_filtered(&self, filter: &AdFilter) -> Result<Vec<Ad>> {
        let models = newest_first(ad::Entity::find().filter(filter_condition(filter)))
            .all(&self.db)
            .await
            .map_err(|e| AdError::database_operation(format!("加载广告失败: {}", e)))?;

        debug!("Loaded {} ads for export", models.len());
        Ok(models.into_iter().map(model_to_ad).collect())
    }

    /// 按广告位分组；五个广告位都会出现，哪怕没有广告
    pub async fn list_grouped_by_slot(&self) -> Result<BTreeMap<Slot, Vec<Ad>>> {
        let models = ad::Entity::find()
            .order_by_asc(ad::Column::SlotPosition)
            .order_by_desc(ad::Column::CreatedAt)
            .order_by_desc(ad::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AdError::database_operation(format!("加载广告失败: {}", e)))?;

        let mut grouped: BTreeMap<Slot, Vec<Ad>> = Slot::all().map(|s| (s, Vec::new())).collect();
        for model in &models {
            if Slot::new(model.slot_position as i64).is_none() {
                warn!(
                    "Ad {} has out-of-range slot_position {}; listed under the nearest slot but never served",
                    model.id, model.slot_position
                );
            }
        }
        for ad in models.into_iter().map(model_to_ad) {
            grouped.entry(ad.slot).or_default().push(ad);
        }
        Ok(grouped)
    }

    pub async fn count(&self) -> Result<u64> {
        let db = &self.db;
        retry::with_retry("count", self.retry_config, || async {
            ad::Entity::find().count(db).await
        })
        .await
        .map_err(|e| AdError::database_operation(format!("统计广告数量失败: {}", e)))
    }

    /// 仪表盘汇总
    pub async fn dashboard_summary(&self, now: DateTime<Utc>) -> Result<DashboardSummary> {
        let db = &self.db;
        let map_err = |e: sea_orm::DbErr| AdError::database_operation(format!("统计查询失败: {}", e));

        let total_ads = ad::Entity::find().count(db).await.map_err(map_err)?;
        let active_ads = ad::Entity::find()
            .filter(ad::Column::IsActive.eq(true))
            .count(db)
            .await
            .map_err(map_err)?;
        let live_ads = ad::Entity::find()
            .filter(live_condition(now))
            .count(db)
            .await
            .map_err(map_err)?;

        let backend = self.db_backend();
        let totals = ad::Entity::find()
            .select_only()
            .column_as(bigint_sum(backend, "impressions_count"), "total_impressions")
            .column_as(bigint_sum(backend, "clicks_count"), "total_clicks")
            .into_model::<CounterTotals>()
            .one(db)
            .await
            .map_err(map_err)?
            .unwrap_or(CounterTotals {
                total_impressions: 0,
                total_clicks: 0,
            });

        let by_type: BTreeMap<String, u64> = ad::Entity::find()
            .select_only()
            .column(ad::Column::AdType)
            .column_as(ad::Column::Id.count(), "count")
            .group_by(ad::Column::AdType)
            .into_model::<TypeCountRow>()
            .all(db)
            .await
            .map_err(map_err)?
            .into_iter()
            .map(|row| (row.ad_type, row.count.max(0) as u64))
            .collect();

        let total_impressions = totals.total_impressions.max(0) as u64;
        let total_clicks = totals.total_clicks.max(0) as u64;

        Ok(DashboardSummary {
            total_ads,
            active_ads,
            inactive_ads: total_ads.saturating_sub(active_ads),
            live_ads,
            ads_by_type: DashboardSummary::fill_types(by_type),
            total_impressions,
            total_clicks,
            ctr: click_through_rate(total_clicks, total_impressions),
        })
    }
}
