use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::sink::{Counter, TrackingSink};
use crate::storage::models::{Ad, AdType, ClickEvent, ImpressionEvent};

/// 发起请求的客户端信息
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<i64>,
    pub referrer: Option<String>,
}

impl ClientInfo {
    pub fn impression(&self, ad_id: i64, video_index: Option<i64>) -> ImpressionEvent {
        ImpressionEvent {
            ad_id,
            user_id: self.user_id,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            video_index,
        }
    }

    /// 请求体里的 referrer 优先，其次是请求头
    pub fn click(&self, ad_id: i64, referrer: Option<String>) -> ClickEvent {
        ClickEvent {
            ad_id,
            user_id: self.user_id,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            referrer: referrer
                .filter(|r| !r.trim().is_empty())
                .or_else(|| self.referrer.clone()),
        }
    }
}

/// 事件被拒绝记录的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotFound,
    Inactive,
    /// 第三方广告网络自行统计点击
    ExternalTracking,
    NoClickUrl,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::NotFound => "Ad not found",
            RejectReason::Inactive => "Ad is not active",
            RejectReason::ExternalTracking => "Clicks on third-party ads are tracked by the ad network",
            RejectReason::NoClickUrl => "Ad has no click URL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum TrackingOutcome {
    /// 明细与计数器都已写入
    Recorded,
    /// 事务失败，仅计数器加一
    CounterOnly,
    Rejected(RejectReason),
    /// 两种写入方式都失败
    Failed,
}

impl TrackingOutcome {
    pub fn recorded(&self) -> bool {
        matches!(self, TrackingOutcome::Recorded | TrackingOutcome::CounterOnly)
    }
}

/// 记录结果，附带记录时读到的广告（点击接口需要跳转地址）
#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub outcome: TrackingOutcome,
    pub ad: Option<Ad>,
}

impl TrackingResult {
    fn without_ad(outcome: TrackingOutcome) -> Self {
        Self { outcome, ad: None }
    }
}

pub struct TrackingRecorder {
    sink: Arc<dyn TrackingSink>,
}

impl TrackingRecorder {
    pub fn new(sink: Arc<dyn TrackingSink>) -> Self {
        Self { sink }
    }

    pub async fn record_impression(&self, event: ImpressionEvent) -> TrackingResult {
        let ad = match self.eligible_ad(event.ad_id).await {
            Ok(ad) => ad,
            Err(result) => return result,
        };

        let outcome = match self.sink.insert_impression(&event).await {
            Ok(()) => TrackingOutcome::Recorded,
            Err(e) => {
                warn!(
                    "Impression transaction failed for ad {}: {}; falling back to counter-only",
                    event.ad_id, e
                );
                self.fallback(event.ad_id, Counter::Impressions).await
            }
        };

        debug!("Impression for ad {}: {:?}", event.ad_id, outcome);
        TrackingResult {
            outcome,
            ad: Some(ad),
        }
    }

    pub async fn record_click(&self, event: ClickEvent) -> TrackingResult {
        let ad = match self.eligible_ad(event.ad_id).await {
            Ok(ad) => ad,
            Err(result) => return result,
        };

        let rejected = if ad.ad_type() == AdType::GoogleAds {
            Some(RejectReason::ExternalTracking)
        } else if ad.creative.click_url().is_none() {
            Some(RejectReason::NoClickUrl)
        } else {
            None
        };
        if let Some(reason) = rejected {
            return TrackingResult {
                outcome: TrackingOutcome::Rejected(reason),
                ad: Some(ad),
            };
        }

        let outcome = match self.sink.insert_click(&event).await {
            Ok(()) => TrackingOutcome::Recorded,
            Err(e) => {
                warn!(
                    "Click transaction failed for ad {}: {}; falling back to counter-only",
                    event.ad_id, e
                );
                self.fallback(event.ad_id, Counter::Clicks).await
            }
        };

        debug!("Click for ad {}: {:?}", event.ad_id, outcome);
        TrackingResult {
            outcome,
            ad: Some(ad),
        }
    }

    /// 存在且启用的广告才会被记录
    async fn eligible_ad(&self, ad_id: i64) -> Result<Ad, TrackingResult> {
        match self.sink.tracked_ad(ad_id).await {
            Ok(Some(ad)) if ad.is_active => Ok(ad),
            Ok(Some(ad)) => Err(TrackingResult {
                outcome: TrackingOutcome::Rejected(RejectReason::Inactive),
                ad: Some(ad),
            }),
            Ok(None) => Err(TrackingResult::without_ad(TrackingOutcome::Rejected(
                RejectReason::NotFound,
            ))),
            Err(e) => {
                error!("Failed to load ad {} for tracking: {}", ad_id, e);
                Err(TrackingResult::without_ad(TrackingOutcome::Failed))
            }
        }
    }

    async fn fallback(&self, ad_id: i64, counter: Counter) -> TrackingOutcome {
        match self.sink.bump_counter(ad_id, counter).await {
            Ok(true) => TrackingOutcome::CounterOnly,
            Ok(false) => TrackingOutcome::Rejected(RejectReason::NotFound),
            Err(e) => {
                error!(
                    "Counter-only fallback failed for ad {} ({:?}): {}",
                    ad_id, counter, e
                );
                TrackingOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{ActiveWindow, AdCreative, Slot};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct MemorySink {
        ad: Mutex<Option<Ad>>,
        fail_transaction: bool,
        fail_counter: bool,
        detail_rows: AtomicU64,
        impressions: AtomicU64,
        clicks: AtomicU64,
    }

    #[async_trait]
    impl TrackingSink for MemorySink {
        async fn tracked_ad(&self, _ad_id: i64) -> anyhow::Result<Option<Ad>> {
            Ok(self.ad.lock().unwrap().clone())
        }

        async fn insert_impression(&self, _event: &ImpressionEvent) -> anyhow::Result<()> {
            if self.fail_transaction {
                anyhow::bail!("database is locked");
            }
            self.detail_rows.fetch_add(1, Ordering::SeqCst);
            self.impressions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn insert_click(&self, _event: &ClickEvent) -> anyhow::Result<()> {
            if self.fail_transaction {
                anyhow::bail!("database is locked");
            }
            self.detail_rows.fetch_add(1, Ordering::SeqCst);
            self.clicks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn bump_counter(&self, _ad_id: i64, counter: Counter) -> anyhow::Result<bool> {
            if self.fail_counter {
                anyhow::bail!("connection refused");
            }
            match counter {
                Counter::Impressions => self.impressions.fetch_add(1, Ordering::SeqCst),
                Counter::Clicks => self.clicks.fetch_add(1, Ordering::SeqCst),
            };
            Ok(true)
        }
    }

    fn ad(creative: AdCreative, is_active: bool) -> Ad {
        let now = Utc::now();
        Ad {
            id: 1,
            title: "Test ad".to_string(),
            description: None,
            creative,
            slot: Slot::FIRST,
            is_active,
            window: ActiveWindow::unbounded(),
            impressions_count: 0,
            clicks_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn image() -> AdCreative {
        AdCreative::Image {
            media_url: "https://cdn.example.com/a.png".to_string(),
            click_url: "https://shop.example.com".to_string(),
            open_new_tab: true,
        }
    }

    fn sink_with(ad: Option<Ad>) -> MemorySink {
        MemorySink {
            ad: Mutex::new(ad),
            ..Default::default()
        }
    }

    fn click(ad_id: i64) -> ClickEvent {
        ClickEvent {
            ad_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_impression_recorded() {
        let sink = Arc::new(sink_with(Some(ad(image(), true))));
        let recorder = TrackingRecorder::new(sink.clone());

        let result = recorder
            .record_impression(ImpressionEvent {
                ad_id: 1,
                video_index: Some(2),
                ..Default::default()
            })
            .await;

        assert_eq!(result.outcome, TrackingOutcome::Recorded);
        assert_eq!(sink.detail_rows.load(Ordering::SeqCst), 1);
        assert_eq!(sink.impressions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transaction_failure_falls_back_to_counter() {
        let sink = Arc::new(MemorySink {
            fail_transaction: true,
            ..sink_with(Some(ad(image(), true)))
        });
        let recorder = TrackingRecorder::new(sink.clone());

        let result = recorder.record_click(click(1)).await;

        assert_eq!(result.outcome, TrackingOutcome::CounterOnly);
        assert!(result.outcome.recorded());
        assert_eq!(sink.detail_rows.load(Ordering::SeqCst), 0);
        assert_eq!(sink.clicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_tiers_failing_reports_failed() {
        let sink = Arc::new(MemorySink {
            fail_transaction: true,
            fail_counter: true,
            ..sink_with(Some(ad(image(), true)))
        });
        let recorder = TrackingRecorder::new(sink);

        let result = recorder.record_impression(ImpressionEvent::default()).await;
        assert_eq!(result.outcome, TrackingOutcome::Failed);
        assert!(!result.outcome.recorded());
    }

    #[tokio::test]
    async fn test_google_ads_click_rejected_without_counter_change() {
        let google = AdCreative::GoogleAds {
            script: "<script></script>".to_string(),
        };
        let sink = Arc::new(sink_with(Some(ad(google, true))));
        let recorder = TrackingRecorder::new(sink.clone());

        let result = recorder.record_click(click(1)).await;

        assert_eq!(
            result.outcome,
            TrackingOutcome::Rejected(RejectReason::ExternalTracking)
        );
        assert_eq!(sink.clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_click_url_rejected() {
        let creative = AdCreative::Image {
            media_url: "https://cdn.example.com/a.png".to_string(),
            click_url: String::new(),
            open_new_tab: false,
        };
        let sink = Arc::new(sink_with(Some(ad(creative, true))));
        let recorder = TrackingRecorder::new(sink.clone());

        let result = recorder.record_click(click(1)).await;
        assert_eq!(
            result.outcome,
            TrackingOutcome::Rejected(RejectReason::NoClickUrl)
        );
        assert_eq!(sink.clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inactive_and_missing_ads_rejected() {
        let recorder = TrackingRecorder::new(Arc::new(sink_with(Some(ad(image(), false)))));
        let result = recorder.record_click(click(1)).await;
        assert_eq!(
            result.outcome,
            TrackingOutcome::Rejected(RejectReason::Inactive)
        );

        let recorder = TrackingRecorder::new(Arc::new(sink_with(None)));
        let result = recorder.record_impression(ImpressionEvent::default()).await;
        assert_eq!(
            result.outcome,
            TrackingOutcome::Rejected(RejectReason::NotFound)
        );
        assert!(result.ad.is_none());
    }

    #[tokio::test]
    async fn test_every_call_adds_one_event() {
        let sink = Arc::new(sink_with(Some(ad(image(), true))));
        let recorder = TrackingRecorder::new(sink.clone());

        for _ in 0..3 {
            recorder.record_click(click(1)).await;
        }
        assert_eq!(sink.clicks.load(Ordering::SeqCst), 3);
    }
}
