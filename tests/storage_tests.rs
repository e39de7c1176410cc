//! 存储层集成测试
//!
//! 每个测试使用独立的临时 SQLite 数据库。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, sea_query::Expr};
use tempfile::TempDir;

use adserver::config::DatabaseConfig;
use adserver::selection::{FeedRequest, FeedService};
use adserver::services::{AdForm, AdsServices};
use adserver::storage::models::{
    ActiveWindow, Ad, AdCreative, AdDraft, AdFilter, AdStatus, AdType, ClickEvent, ImpressionEvent,
    Slot,
};
use adserver::storage::{SeaOrmStorage, StorageFactory};
use adserver::tracking::{ClientInfo, Counter, TrackingOutcome, TrackingRecorder, TrackingSink};
use migration::entities::{AdClickEntity, AdEntity, AdImpressionEntity, ad};

async fn setup() -> (TempDir, Arc<SeaOrmStorage>) {
    let dir = TempDir::new().expect("创建临时目录失败");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ads.db").display());
    let storage = StorageFactory::create(&DatabaseConfig::with_url(url))
        .await
        .expect("创建存储失败");
    (dir, storage)
}

fn image_draft(title: &str, slot: u8) -> AdDraft {
    AdDraft {
        title: title.to_string(),
        description: None,
        creative: AdCreative::Image {
            media_url: "https://cdn.example.com/banner.png".to_string(),
            click_url: "https://shop.example.com/landing".to_string(),
            open_new_tab: true,
        },
        slot: Slot::new(slot as i64).expect("slot in range"),
        is_active: true,
        window: ActiveWindow::unbounded(),
    }
}

fn recorder(storage: &Arc<SeaOrmStorage>) -> TrackingRecorder {
    let sink: Arc<dyn TrackingSink> = storage.clone();
    TrackingRecorder::new(sink)
}

#[tokio::test]
async fn test_create_and_find() {
    let (_dir, storage) = setup().await;

    let ad = storage.create(&image_draft("Summer sale", 2)).await.unwrap();
    assert!(ad.id > 0);
    assert_eq!(ad.impressions_count, 0);
    assert_eq!(ad.clicks_count, 0);

    let found = storage.find_by_id(ad.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Summer sale");
    assert_eq!(found.slot.get(), 2);
    assert_eq!(found.creative, ad.creative);

    assert!(storage.find_by_id(ad.id + 100).await.unwrap().is_none());
    assert_eq!(storage.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_active_by_slot_respects_flag_and_window() {
    let (_dir, storage) = setup().await;
    let now = Utc::now();

    let mut inactive = image_draft("Paused", 3);
    inactive.is_active = false;
    storage.create(&inactive).await.unwrap();

    let mut expired = image_draft("Expired", 3);
    expired.window = ActiveWindow {
        starts_at: Some(now - Duration::days(10)),
        ends_at: Some(now - Duration::days(1)),
    };
    storage.create(&expired).await.unwrap();

    let mut future = image_draft("Not yet", 3);
    future.window = ActiveWindow {
        starts_at: Some(now + Duration::days(1)),
        ends_at: None,
    };
    storage.create(&future).await.unwrap();

    let slot = Slot::new(3).unwrap();
    assert!(storage.find_active_by_slot(slot, now).await.unwrap().is_none());

    let live = storage.create(&image_draft("Live", 3)).await.unwrap();
    let served = storage.find_active_by_slot(slot, now).await.unwrap().unwrap();
    assert_eq!(served.id, live.id);

    // 其他广告位不受影响
    assert!(
        storage
            .find_active_by_slot(Slot::new(4).unwrap(), now)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_newest_live_ad_wins() {
    let (_dir, storage) = setup().await;
    let first = storage.create(&image_draft("First", 1)).await.unwrap();
    let second = storage.create(&image_draft("Second", 1)).await.unwrap();
    assert!(second.id > first.id);

    let served = storage
        .find_active_by_slot(Slot::FIRST, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.id, second.id);
}

#[tokio::test]
async fn test_update_keeps_counters_and_created_at() {
    let (_dir, storage) = setup().await;
    let ad = storage.create(&image_draft("Original", 1)).await.unwrap();

    let recorder = recorder(&storage);
    let client = ClientInfo::default();
    recorder.record_impression(client.impression(ad.id, Some(2))).await;

    let mut draft = image_draft("Renamed", 4);
    draft.creative = AdCreative::Video {
        media_url: "https://cdn.example.com/clip.mp4".to_string(),
        click_url: "https://shop.example.com/video".to_string(),
        open_new_tab: false,
        duration_secs: 15,
    };
    let updated = storage.update(ad.id, &draft).await.unwrap().unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.slot.get(), 4);
    assert_eq!(updated.ad_type(), AdType::Video);
    assert_eq!(updated.creative.duration_secs(), 15);
    assert_eq!(updated.impressions_count, 1);
    assert_eq!(updated.created_at, ad.created_at);

    assert!(storage.update(9999, &draft).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_tracking_rows() {
    let (_dir, storage) = setup().await;
    let ad = storage.create(&image_draft("Doomed", 2)).await.unwrap();
    let keep = storage.create(&image_draft("Keeper", 2)).await.unwrap();

    let recorder = recorder(&storage);
    let client = ClientInfo::default();
    for id in [ad.id, keep.id] {
        recorder.record_impression(client.impression(id, None)).await;
        recorder.record_click(client.click(id, None)).await;
    }

    assert!(storage.delete(ad.id).await.unwrap());
    assert!(!storage.delete(ad.id).await.unwrap());
    assert!(storage.find_by_id(ad.id).await.unwrap().is_none());

    let db = storage.get_db();
    assert_eq!(AdImpressionEntity::find().count(db).await.unwrap(), 1);
    assert_eq!(AdClickEntity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_toggle_and_set_active() {
    let (_dir, storage) = setup().await;
    let ad = storage.create(&image_draft("Flip", 5)).await.unwrap();

    let toggled = storage.toggle_active(ad.id).await.unwrap().unwrap();
    assert!(!toggled.is_active);
    let toggled = storage.toggle_active(ad.id).await.unwrap().unwrap();
    assert!(toggled.is_active);

    let off = storage.set_active(ad.id, false).await.unwrap().unwrap();
    assert!(!off.is_active);

    assert!(storage.toggle_active(424242).await.unwrap().is_none());
}

#[tokio::test]
async fn test_clone_is_inactive_and_unbounded() {
    let (_dir, storage) = setup().await;
    let mut draft = image_draft("Holiday", 2);
    draft.window = ActiveWindow {
        starts_at: Some(Utc::now() - Duration::days(1)),
        ends_at: Some(Utc::now() + Duration::days(1)),
    };
    let ad = storage.create(&draft).await.unwrap();

    let copy = storage.clone_ad(ad.id, None).await.unwrap().unwrap();
    assert_ne!(copy.id, ad.id);
    assert_eq!(copy.title, "Holiday (Copy)");
    assert!(!copy.is_active);
    assert_eq!(copy.window, ActiveWindow::unbounded());
    assert_eq!(copy.creative, ad.creative);
    assert_eq!(copy.slot, ad.slot);

    let named = storage.clone_ad(ad.id, Some("Holiday B")).await.unwrap().unwrap();
    assert_eq!(named.title, "Holiday B");

    assert!(storage.clone_ad(777, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let (_dir, storage) = setup().await;
    for i in 0..5 {
        storage
            .create(&image_draft(&format!("Promo {}", i), 1))
            .await
            .unwrap();
    }
    let mut paused = image_draft("Paused video", 2);
    paused.is_active = false;
    paused.creative = AdCreative::Video {
        media_url: "/media/clip.mp4".to_string(),
        click_url: "https://example.com".to_string(),
        open_new_tab: true,
        duration_secs: 0,
    };
    storage.create(&paused).await.unwrap();

    let (page, total) = storage
        .list_paginated(&AdFilter::default(), 1, 4)
        .await
        .unwrap();
    assert_eq!(total, 6);
    assert_eq!(page.len(), 4);
    // 最新的在前
    assert_eq!(page[0].title, "Paused video");

    let (page2, _) = storage
        .list_paginated(&AdFilter::default(), 2, 4)
        .await
        .unwrap();
    assert_eq!(page2.len(), 2);

    let inactive = AdFilter {
        status: Some(AdStatus::Inactive),
        ..Default::default()
    };
    let (rows, total) = storage.list_paginated(&inactive, 1, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].ad_type(), AdType::Video);

    let search = AdFilter {
        search: Some("promo 3".to_string()),
        ..Default::default()
    };
    let all = storage.load_all_filtered(&search).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Promo 3");

    let by_slot = storage.list_grouped_by_slot().await.unwrap();
    assert_eq!(by_slot.len(), 5);
    assert_eq!(by_slot[&Slot::FIRST].len(), 5);
    assert!(by_slot[&Slot::new(5).unwrap()].is_empty());
}

#[tokio::test]
async fn test_tracking_counts_every_event() {
    let (_dir, storage) = setup().await;
    let ad = storage.create(&image_draft("Counted", 1)).await.unwrap();
    let recorder = recorder(&storage);
    let client = ClientInfo {
        ip_address: Some("203.0.113.9".to_string()),
        user_agent: Some("test-agent".to_string()),
        user_id: Some(42),
        referrer: Some("https://videos.example.com/watch".to_string()),
    };

    for _ in 0..3 {
        let result = recorder.record_impression(client.impression(ad.id, Some(5))).await;
        assert_eq!(result.outcome, TrackingOutcome::Recorded);
    }
    let click = recorder.record_click(client.click(ad.id, None)).await;
    assert_eq!(click.outcome, TrackingOutcome::Recorded);

    let ad = storage.find_by_id(ad.id).await.unwrap().unwrap();
    assert_eq!(ad.impressions_count, 3);
    assert_eq!(ad.clicks_count, 1);

    let clicks = AdClickEntity::find().all(storage.get_db()).await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].user_id, Some(42));
    assert_eq!(
        clicks[0].referrer.as_deref(),
        Some("https://videos.example.com/watch")
    );
}

#[tokio::test]
async fn test_google_ads_click_not_recorded() {
    let (_dir, storage) = setup().await;
    let mut draft = image_draft("Network tag", 2);
    draft.creative = AdCreative::GoogleAds {
        script: "<script async src=\"https://ads.example.net/tag.js\"></script>".to_string(),
    };
    let ad = storage.create(&draft).await.unwrap();

    let result = recorder(&storage)
        .record_click(ClientInfo::default().click(ad.id, None))
        .await;
    assert!(!result.outcome.recorded());

    let ad = storage.find_by_id(ad.id).await.unwrap().unwrap();
    assert_eq!(ad.clicks_count, 0);
    assert_eq!(AdClickEntity::find().count(storage.get_db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_dashboard_and_analytics() {
    let (_dir, storage) = setup().await;
    let empty = storage.dashboard_summary(Utc::now()).await.unwrap();
    assert_eq!(empty.total_ads, 0);
    assert_eq!(empty.ctr, 0.0);
    assert_eq!(empty.ads_by_type.len(), 3);

    let ad = storage.create(&image_draft("Tracked", 1)).await.unwrap();
    let mut off = image_draft("Off", 2);
    off.is_active = false;
    storage.create(&off).await.unwrap();

    let recorder = recorder(&storage);
    let client = ClientInfo::default();
    for _ in 0..3 {
        recorder.record_impression(client.impression(ad.id, None)).await;
    }
    recorder.record_click(client.click(ad.id, None)).await;

    let summary = storage.dashboard_summary(Utc::now()).await.unwrap();
    assert_eq!(summary.total_ads, 2);
    assert_eq!(summary.active_ads, 1);
    assert_eq!(summary.inactive_ads, 1);
    assert_eq!(summary.live_ads, 1);
    assert_eq!(summary.ads_by_type.get("image"), Some(&2));
    assert_eq!(summary.total_impressions, 3);
    assert_eq!(summary.total_clicks, 1);
    assert_eq!(summary.ctr, 33.33);

    let analytics = storage
        .ad_analytics(ad.id, 7, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(analytics.days, 7);
    assert_eq!(analytics.daily.len(), 7);
    assert!(analytics.daily.windows(2).all(|w| w[0].date < w[1].date));
    let today = analytics.daily.last().unwrap();
    assert_eq!(today.impressions, 3);
    assert_eq!(today.clicks, 1);
    assert_eq!(analytics.window.impressions, 3);
    assert_eq!(analytics.lifetime.clicks, 1);

    assert!(storage.ad_analytics(999, 7, Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ping_and_close() {
    let (_dir, storage) = setup().await;
    storage.ping().await.unwrap();
    assert_eq!(storage.backend_name(), "sqlite");
    storage.close().await.unwrap();
    assert!(storage.ping().await.is_err());
}

/// 读走真实存储，所有写入都失败
struct BrokenWrites {
    storage: Arc<SeaOrmStorage>,
}

#[async_trait]
impl TrackingSink for BrokenWrites {
    async fn tracked_ad(&self, ad_id: i64) -> anyhow::Result<Option<Ad>> {
        self.storage.tracked_ad(ad_id).await
    }

    async fn insert_impression(&self, _event: &ImpressionEvent) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn insert_click(&self, _event: &ClickEvent) -> anyhow::Result<()> {
        anyhow::bail!("disk I/O error")
    }

    async fn bump_counter(&self, _ad_id: i64, _counter: Counter) -> anyhow::Result<bool> {
        anyhow::bail!("disk I/O error")
    }
}

#[tokio::test]
async fn test_feed_serves_ad_when_impression_write_fails() {
    let (_dir, storage) = setup().await;
    let ad = storage.create(&image_draft("Still shown", 2)).await.unwrap();

    let sink: Arc<dyn TrackingSink> = Arc::new(BrokenWrites {
        storage: storage.clone(),
    });
    let feed = FeedService::new(storage.clone(), Arc::new(TrackingRecorder::new(sink)));

    let req = FeedRequest::from_raw(Some("2"), None).unwrap();
    let decision = feed.next_ad(req, &ClientInfo::default()).await.unwrap();
    assert!(decision.show_ad());
    assert_eq!(decision.ad.as_ref().map(|a| a.id), Some(ad.id));
    assert_eq!(decision.impression, Some(TrackingOutcome::Failed));

    let stored = storage.find_by_id(ad.id).await.unwrap().unwrap();
    assert_eq!(stored.impressions_count, 0);
    assert_eq!(AdImpressionEntity::find().count(storage.get_db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_update_and_forced_active_state() {
    let (_dir, storage) = setup().await;
    let services = AdsServices::new(storage.clone());
    let created = storage.create(&image_draft("Untouched", 3)).await.unwrap();
    let ad = storage.find_by_id(created.id).await.unwrap().unwrap();

    let same = services.ads.update(ad.id, AdForm::default()).await.unwrap();
    assert_eq!(same, ad);

    let off = services.ads.set_active(ad.id, false).await.unwrap();
    assert!(!off.is_active);
    let still_off = services.ads.set_active(ad.id, false).await.unwrap();
    assert!(!still_off.is_active);

    let err = services.ads.set_active(424242, true).await.unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn test_out_of_range_slot_is_listed_but_not_serving() {
    let (_dir, storage) = setup().await;
    let services = AdsServices::new(storage.clone());
    let stray = storage.create(&image_draft("Stray", 5)).await.unwrap();
    let live = storage.create(&image_draft("Live", 1)).await.unwrap();

    AdEntity::update_many()
        .col_expr(ad::Column::SlotPosition, Expr::value(9))
        .filter(ad::Column::Id.eq(stray.id))
        .exec(storage.get_db())
        .await
        .unwrap();

    let groups = services.ads.grouped_by_slot().await.unwrap();
    assert_eq!(groups.len(), 5);
    assert_eq!(groups[0].serving_id, Some(live.id));

    let last = &groups[4];
    assert_eq!(last.slot.get(), 5);
    assert_eq!(last.ads.iter().map(|a| a.id).collect::<Vec<_>>(), vec![stray.id]);
    assert_eq!(last.serving_id, None);

    let fifth = Slot::new(5).unwrap();
    assert!(storage.find_active_by_slot(fifth, Utc::now()).await.unwrap().is_none());
}
