//! Ad management service
//!
//! Business logic for ad administration, shared between the HTTP admin
//! API and the CLI. Handlers parse requests, this layer validates them and
//! turns "missing" results from storage into `NotFound` errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::export::{self, ExportFormat};
use super::validation::{AdForm, validate_title};
use crate::errors::{AdError, Result};
use crate::storage::backend::clamp_days;
use crate::storage::models::{
    Ad, AdAnalytics, AdFilter, AdStatus, AdType, DashboardSummary, Slot,
};
use crate::storage::SeaOrmStorage;

/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// 一页广告
#[derive(Debug, Clone, Serialize)]
pub struct AdPage {
    pub items: Vec<Ad>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl AdPage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

/// 一个广告位及其下的广告
#[derive(Debug, Clone, Serialize)]
pub struct SlotGroup {
    pub slot: Slot,
    /// 当前实际投放的广告
    pub serving_id: Option<i64>,
    pub ads: Vec<Ad>,
}

/// 从查询参数的原始值构造过滤条件，空值忽略
pub fn parse_filter(
    status: Option<&str>,
    ad_type: Option<&str>,
    slot: Option<&str>,
    search: Option<&str>,
) -> Result<AdFilter> {
    fn present(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }

    let status = present(status)
        .map(|s| {
            s.parse::<AdStatus>()
                .map_err(|_| AdError::validation("status", "status must be active or inactive"))
        })
        .transpose()?;
    let ad_type = present(ad_type)
        .map(|s| {
            s.parse::<AdType>().map_err(|_| {
                AdError::validation("type", "type must be one of image, video, google_ads")
            })
        })
        .transpose()?;
    let slot = present(slot)
        .map(|s| {
            s.parse::<i64>()
                .ok()
                .and_then(Slot::new)
                .ok_or_else(|| AdError::validation("slot", "slot must be between 1 and 5"))
        })
        .transpose()?;

    Ok(AdFilter {
        status,
        ad_type,
        slot,
        search: present(search).map(str::to_string),
    })
}

pub struct AdService {
    storage: Arc<SeaOrmStorage>,
}

impl AdService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    fn not_found(id: i64) -> AdError {
        AdError::not_found(format!("Ad {} not found", id))
    }

    pub async fn create(&self, form: AdForm) -> Result<Ad> {
        let draft = form.into_draft()?;
        let ad = self.storage.create(&draft).await?;
        info!(
            "AdService: created ad {} '{}' ({}, slot {})",
            ad.id,
            ad.title,
            ad.ad_type(),
            ad.slot
        );
        Ok(ad)
    }

    pub async fn get(&self, id: i64) -> Result<Ad> {
        self.storage
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// 部分更新：未提供的字段保留原值
    pub async fn update(&self, id: i64, form: AdForm) -> Result<Ad> {
        let existing = self.get(id).await?;
        if form.is_empty() {
            debug!("AdService: empty update for ad {}, nothing to write", id);
            return Ok(existing);
        }
        let draft = form.merge_onto(&existing)?;
        let ad = self
            .storage
            .update(id, &draft)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        info!("AdService: updated ad {}", id);
        Ok(ad)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.storage.delete(id).await? {
            return Err(Self::not_found(id));
        }
        info!("AdService: deleted ad {}", id);
        Ok(())
    }

    pub async fn toggle(&self, id: i64) -> Result<Ad> {
        self.storage
            .toggle_active(id)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<Ad> {
        self.storage
            .set_active(id, is_active)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// 复制广告；自定义标题同样要满足长度限制
    pub async fn clone_ad(&self, id: i64, title: Option<&str>) -> Result<Ad> {
        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(validate_title(t)?),
            None => None,
        };
        self.storage
            .clone_ad(id, title.as_deref())
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn list(
        &self,
        filter: &AdFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<AdPage> {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, crate::storage::backend::MAX_PAGE_SIZE);
        let (items, total) = self.storage.list_paginated(filter, page, page_size).await?;
        Ok(AdPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// 五个广告位都会出现；serving_id 与拉取接口选中的广告一致
    pub async fn grouped_by_slot(&self) -> Result<Vec<SlotGroup>> {
        let now = Utc::now();
        let grouped: BTreeMap<Slot, Vec<Ad>> = self.storage.list_grouped_by_slot().await?;
        let mut groups = Vec::with_capacity(grouped.len());
        for (slot, ads) in grouped {
            // 与前台投放走同一条查询，越界的脏数据不会被标成正在投放
            let serving_id = self
                .storage
                .find_active_by_slot(slot, now)
                .await?
                .map(|ad| ad.id);
            groups.push(SlotGroup {
                slot,
                serving_id,
                ads,
            });
        }
        Ok(groups)
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        self.storage.dashboard_summary(Utc::now()).await
    }

    pub async fn analytics(&self, id: i64, days: Option<u32>) -> Result<AdAnalytics> {
        self.storage
            .ad_analytics(id, clamp_days(days), Utc::now())
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn export(&self, filter: &AdFilter, format: ExportFormat) -> Result<Vec<u8>> {
        let ads = self.storage.load_all_filtered(filter).await?;
        let body = export::render(&ads, format)?;
        info!(
            "AdService: exported {} ads as {}",
            ads.len(),
            format.extension()
        );
        Ok(body)
    }
}
