//! Feed service
//!
//! Turns a viewer's position in the video feed into a concrete ad.
//! The placement decision is pure; storage is only consulted when the
//! policy decides to serve.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::policy::{Placement, place};
use crate::errors::{AdError, Result};
use crate::storage::SeaOrmStorage;
use crate::storage::models::{Ad, Slot};
use crate::tracking::{ClientInfo, TrackingOutcome, TrackingRecorder};

/// 解析后的拉取请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRequest {
    pub video_index: u64,
    pub slot: Option<Slot>,
}

impl FeedRequest {
    /// 从查询字符串的原始值构造请求
    ///
    /// `videoIndex` 缺省为 0；显式 `slot` 必须落在 1..=5。
    pub fn from_raw(video_index: Option<&str>, slot: Option<&str>) -> Result<Self> {
        let video_index = match video_index.map(str::trim).filter(|s| !s.is_empty()) {
            None => 0,
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AdError::validation("videoIndex", "videoIndex must be a non-negative integer")
            })?,
        };

        let slot = match slot.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => {
                let parsed = raw
                    .parse::<i64>()
                    .ok()
                    .and_then(Slot::new)
                    .ok_or_else(|| AdError::validation("slot", "slot must be between 1 and 5"))?;
                Some(parsed)
            }
        };

        Ok(Self { video_index, slot })
    }
}

/// 一次拉取的结果
#[derive(Debug, Clone, Serialize)]
pub struct FeedDecision {
    pub placement: Placement,
    pub ad: Option<Ad>,
    /// 仅在实际返回广告时存在
    pub impression: Option<TrackingOutcome>,
}

impl FeedDecision {
    pub fn show_ad(&self) -> bool {
        self.ad.is_some()
    }

    pub fn slot(&self) -> Option<Slot> {
        self.placement.slot()
    }
}

pub struct FeedService {
    storage: Arc<SeaOrmStorage>,
    recorder: Arc<TrackingRecorder>,
}

impl FeedService {
    pub fn new(storage: Arc<SeaOrmStorage>, recorder: Arc<TrackingRecorder>) -> Self {
        Self { storage, recorder }
    }

    /// 选出当前位置应展示的广告，并尽力记录一次曝光
    ///
    /// 曝光写入失败不会影响返回结果。
    pub async fn next_ad(&self, req: FeedRequest, client: &ClientInfo) -> Result<FeedDecision> {
        let placement = place(req.video_index, req.slot);
        let Some(slot) = placement.slot() else {
            return Ok(FeedDecision {
                placement,
                ad: None,
                impression: None,
            });
        };

        let Some(ad) = self.storage.find_active_by_slot(slot, Utc::now()).await? else {
            debug!("No live ad for slot {} (videoIndex {})", slot, req.video_index);
            return Ok(FeedDecision {
                placement,
                ad: None,
                impression: None,
            });
        };

        let video_index = i64::try_from(req.video_index).ok();
        let result = self
            .recorder
            .record_impression(client.impression(ad.id, video_index))
            .await;
        if !result.outcome.recorded() {
            warn!(
                "Impression for ad {} not recorded: {:?}",
                ad.id, result.outcome
            );
        }

        Ok(FeedDecision {
            placement,
            ad: Some(ad),
            impression: Some(result.outcome),
        })
    }
}
