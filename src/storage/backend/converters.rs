use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{ActiveWindow, Ad, AdCreative, AdDraft, AdType, Slot};
use migration::entities::ad;

/// 将 Sea-ORM Model 转换为 Ad
///
/// 数据库中的历史数据可能不满足当前校验规则，这里宽松处理：
/// 未知类型按图片处理，缺失的地址记为空串（空点击地址的广告不会记录点击）。
pub fn model_to_ad(model: ad::Model) -> Ad {
    let ad_type = model.ad_type.parse::<AdType>().unwrap_or_else(|_| {
        warn!(
            "Ad {} has unknown ad_type '{}', treating as image",
            model.id, model.ad_type
        );
        AdType::Image
    });

    let creative = match ad_type {
        AdType::Image => AdCreative::Image {
            media_url: model.media_url.unwrap_or_default(),
            click_url: model.click_url.unwrap_or_default(),
            open_new_tab: model.open_new_tab,
        },
        AdType::Video => AdCreative::Video {
            media_url: model.media_url.unwrap_or_default(),
            click_url: model.click_url.unwrap_or_default(),
            open_new_tab: model.open_new_tab,
            duration_secs: model.duration.max(0) as u32,
        },
        AdType::GoogleAds => AdCreative::GoogleAds {
            script: model.google_ads_script.unwrap_or_default(),
        },
    };

    Ad {
        id: model.id,
        title: model.title,
        description: model.description,
        creative,
        slot: Slot::clamped(model.slot_position as i64),
        is_active: model.is_active,
        window: ActiveWindow {
            starts_at: model.start_date,
            ends_at: model.end_date,
        },
        impressions_count: model.impressions_count.max(0) as u64,
        clicks_count: model.clicks_count.max(0) as u64,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 将 AdDraft 转换为 ActiveModel
///
/// 只写可编辑列；`is_new` 时额外初始化计数器与创建时间。
/// id、计数器、created_at 在更新时保持 NotSet，不会被覆盖。
pub fn draft_to_active_model(draft: &AdDraft, now: DateTime<Utc>, is_new: bool) -> ad::ActiveModel {
    let (media_url, click_url, script, open_new_tab, duration) = match &draft.creative {
        AdCreative::Image {
            media_url,
            click_url,
            open_new_tab,
        } => (
            Some(media_url.clone()),
            Some(click_url.clone()),
            None,
            *open_new_tab,
            0,
        ),
        AdCreative::Video {
            media_url,
            click_url,
            open_new_tab,
            duration_secs,
        } => (
            Some(media_url.clone()),
            Some(click_url.clone()),
            None,
            *open_new_tab,
            (*duration_secs).min(i32::MAX as u32) as i32,
        ),
        AdCreative::GoogleAds { script } => (None, None, Some(script.clone()), false, 0),
    };

    ad::ActiveModel {
        id: NotSet,
        title: Set(draft.title.clone()),
        description: Set(draft.description.clone()),
        ad_type: Set(draft.creative.ad_type().as_ref().to_string()),
        media_url: Set(media_url),
        google_ads_script: Set(script),
        click_url: Set(click_url),
        open_new_tab: Set(open_new_tab),
        duration: Set(duration),
        slot_position: Set(draft.slot.get() as i32),
        is_active: Set(draft.is_active),
        start_date: Set(draft.window.starts_at),
        end_date: Set(draft.window.ends_at),
        impressions_count: if is_new { Set(0) } else { NotSet },
        clicks_count: if is_new { Set(0) } else { NotSet },
        created_at: if is_new { Set(now) } else { NotSet },
        updated_at: Set(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::ActiveValue;

    fn model(ad_type: &str) -> ad::Model {
        let now = Utc::now();
        ad::Model {
            id: 7,
            title: "Launch week".to_string(),
            description: Some("hero banner".to_string()),
            ad_type: ad_type.to_string(),
            media_url: Some("https://cdn.example.com/hero.png".to_string()),
            google_ads_script: Some("<ins class=\"adsbygoogle\"></ins>".to_string()),
            click_url: None,
            open_new_tab: true,
            duration: -4,
            slot_position: 9,
            is_active: true,
            start_date: Some(now - Duration::days(1)),
            end_date: None,
            impressions_count: 12,
            clicks_count: -1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_model_to_ad_is_lenient() {
        let ad = model_to_ad(model("video"));
        assert_eq!(ad.ad_type(), AdType::Video);
        assert_eq!(ad.creative.duration_secs(), 0);
        assert_eq!(ad.creative.click_url(), None);
        assert_eq!(ad.slot.get(), 5);
        assert_eq!(ad.clicks_count, 0);
        assert_eq!(ad.impressions_count, 12);
    }

    #[test]
    fn test_google_ads_conversion_drops_media() {
        let ad = model_to_ad(model("google_ads"));
        assert_eq!(
            ad.creative.script(),
            Some("<ins class=\"adsbygoogle\"></ins>")
        );
        assert_eq!(ad.creative.media_url(), None);
    }

    #[test]
    fn test_unknown_type_falls_back_to_image() {
        assert_eq!(model_to_ad(model("popup")).ad_type(), AdType::Image);
    }

    #[test]
    fn test_update_model_leaves_counters_untouched() {
        let ad = model_to_ad(model("image"));
        let draft = AdDraft::from(&ad);
        let now = Utc::now();

        let update = draft_to_active_model(&draft, now, false);
        assert!(matches!(update.id, ActiveValue::NotSet));
        assert!(matches!(update.impressions_count, ActiveValue::NotSet));
        assert!(matches!(update.clicks_count, ActiveValue::NotSet));
        assert!(matches!(update.created_at, ActiveValue::NotSet));
        assert!(matches!(update.updated_at, ActiveValue::Set(t) if t == now));

        let insert = draft_to_active_model(&draft, now, true);
        assert!(matches!(insert.impressions_count, ActiveValue::Set(0)));
        assert!(matches!(insert.created_at, ActiveValue::Set(t) if t == now));
        assert!(matches!(insert.google_ads_script, ActiveValue::Set(None)));
        if let ActiveValue::Set(ad_type) = insert.ad_type {
            assert_eq!(ad_type, "image");
        }
    }
}
