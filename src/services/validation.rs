//! 广告表单验证
//!
//! 提供统一的 "原始表单字段 → AdDraft" 转换和验证，JSON 请求体、
//! HTML 表单和 CLI 共用。
//!
//! 表单提交的值全是字符串，所以布尔和数字字段都按宽松规则解析：
//! `"on" / "true" / "1" / "yes"` 为真，`"off" / "false" / "0" / "no" / ""` 为假。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::errors::{AdError, Result};
use crate::storage::models::{
    ActiveWindow, Ad, AdCreative, AdDraft, AdType, SLOT_COUNT, Slot, TITLE_MAX_LEN,
};
use crate::utils::url_validator::{validate_media_url, validate_url};

/// 标题最短长度（字符）
pub const TITLE_MIN_LEN: usize = 3;

/// 接受的非 RFC3339 时间格式（按 UTC 解释），与 datetime-local 输入框一致
const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

fn loose_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    let Some(value) = Option::<Loose>::deserialize(d)? else {
        return Ok(None);
    };
    match value {
        Loose::Bool(b) => Ok(Some(b)),
        Loose::Int(i) => Ok(Some(i != 0)),
        Loose::Float(f) => Ok(Some(f != 0.0)),
        Loose::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => Ok(Some(true)),
            "off" | "false" | "0" | "no" | "" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean value: {}",
                other
            ))),
        },
    }
}

fn loose_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    let Some(value) = Option::<Loose>::deserialize(d)? else {
        return Ok(None);
    };
    match value {
        Loose::Int(i) => Ok(Some(i)),
        Loose::Float(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Loose::Str(s) if s.trim().is_empty() => Ok(None),
        Loose::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid integer value: {}", s))),
        _ => Err(serde::de::Error::custom("expected an integer")),
    }
}

/// 空串视为未提供
fn loose_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(loose_text(d)?.filter(|s| !s.trim().is_empty()))
}

/// 保留空串：更新时空串表示清空
fn loose_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let Some(value) = Option::<Loose>::deserialize(d)? else {
        return Ok(None);
    };
    Ok(Some(match value {
        Loose::Str(s) => s,
        Loose::Bool(b) => b.to_string(),
        Loose::Int(i) => i.to_string(),
        Loose::Float(f) => f.to_string(),
    }))
}

/// 广告表单
///
/// 所有字段都可缺省：创建时缺省字段取默认值，更新时缺省字段保留原值。
/// `description`、`start_date`、`end_date` 传空串表示清空。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdForm {
    #[serde(deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub description: Option<String>,
    #[serde(alias = "type", deserialize_with = "loose_string")]
    pub ad_type: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub media_url: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub google_ads_script: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub click_url: Option<String>,
    #[serde(deserialize_with = "loose_bool")]
    pub open_new_tab: Option<bool>,
    #[serde(deserialize_with = "loose_int")]
    pub duration: Option<i64>,
    #[serde(alias = "slot", deserialize_with = "loose_int")]
    pub slot_position: Option<i64>,
    #[serde(deserialize_with = "loose_bool")]
    pub is_active: Option<bool>,
    #[serde(deserialize_with = "loose_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_text")]
    pub end_date: Option<String>,
}

/// 校验前的完整字段集合
struct Fields {
    title: String,
    description: Option<String>,
    ad_type: AdType,
    media_url: Option<String>,
    script: Option<String>,
    click_url: Option<String>,
    open_new_tab: bool,
    duration: i64,
    slot: i64,
    is_active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl Fields {
    fn defaults() -> Self {
        Self {
            title: String::new(),
            description: None,
            ad_type: AdType::Image,
            media_url: None,
            script: None,
            click_url: None,
            open_new_tab: true,
            duration: 0,
            slot: Slot::FIRST.get() as i64,
            is_active: true,
            start_date: None,
            end_date: None,
        }
    }

    fn from_ad(ad: &Ad) -> Self {
        Self {
            title: ad.title.clone(),
            description: ad.description.clone(),
            ad_type: ad.ad_type(),
            media_url: ad.creative.media_url().map(str::to_string),
            script: ad.creative.script().map(str::to_string),
            click_url: ad.creative.click_url().map(str::to_string),
            // 第三方广告没有该字段，切换类型时取创建默认值
            open_new_tab: match ad.creative {
                AdCreative::GoogleAds { .. } => true,
                _ => ad.creative.open_new_tab(),
            },
            duration: ad.creative.duration_secs() as i64,
            slot: ad.slot.get() as i64,
            is_active: ad.is_active,
            start_date: ad.window.starts_at,
            end_date: ad.window.ends_at,
        }
    }

    fn into_draft(self) -> Result<AdDraft> {
        let title = validate_title(&self.title)?;

        let slot = Slot::new(self.slot).ok_or_else(|| {
            AdError::validation(
                "slot_position",
                format!("slot_position must be between 1 and {}", SLOT_COUNT),
            )
        })?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(AdError::validation(
                "end_date",
                "end_date must not be earlier than start_date",
            ));
        }

        let creative = match self.ad_type {
            AdType::GoogleAds => AdCreative::GoogleAds {
                script: self.script.ok_or_else(|| {
                    AdError::validation(
                        "google_ads_script",
                        "google_ads_script is required for google_ads ads",
                    )
                })?,
            },
            AdType::Image | AdType::Video => {
                let media_url = required("media_url", self.media_url, self.ad_type)?;
                validate_media_url(&media_url)
                    .map_err(|e| AdError::validation("media_url", e.to_string()))?;

                let click_url = required("click_url", self.click_url, self.ad_type)?;
                validate_url(&click_url)
                    .map_err(|e| AdError::validation("click_url", e.to_string()))?;

                if self.ad_type == AdType::Video {
                    let duration_secs = u32::try_from(self.duration).map_err(|_| {
                        AdError::validation("duration", "duration must be a non-negative integer")
                    })?;
                    AdCreative::Video {
                        media_url,
                        click_url,
                        open_new_tab: self.open_new_tab,
                        duration_secs,
                    }
                } else {
                    AdCreative::Image {
                        media_url,
                        click_url,
                        open_new_tab: self.open_new_tab,
                    }
                }
            }
        };

        Ok(AdDraft {
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            creative,
            slot,
            is_active: self.is_active,
            window: ActiveWindow {
                starts_at: self.start_date,
                ends_at: self.end_date,
            },
        })
    }
}

fn required(field: &str, value: Option<String>, ad_type: AdType) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AdError::validation(field, format!("{} is required for {} ads", field, ad_type)))
}

/// 标题去掉首尾空白后须为 3..=255 个字符
pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    let len = title.chars().count();
    if len < TITLE_MIN_LEN || len > TITLE_MAX_LEN {
        return Err(AdError::validation(
            "title",
            format!(
                "title must be between {} and {} characters",
                TITLE_MIN_LEN, TITLE_MAX_LEN
            ),
        ));
    }
    Ok(title.to_string())
}

/// 解析时间：RFC3339，或不带时区的本地格式（按 UTC）
///
/// 空串返回 `Ok(None)`。
pub fn parse_datetime(field: &str, raw: &str) -> Result<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| {
            AdError::validation(
                field,
                format!("{} must be RFC3339 or YYYY-MM-DDTHH:MM", field),
            )
        })
}

fn parse_ad_type(raw: &str) -> Result<AdType> {
    raw.trim().parse::<AdType>().map_err(|_| {
        AdError::validation("ad_type", "ad_type must be one of image, video, google_ads")
    })
}

impl AdForm {
    /// 创建：标题必填，其余字段缺省取默认值
    pub fn into_draft(self) -> Result<AdDraft> {
        let mut fields = Fields::defaults();
        self.apply(&mut fields)?;
        fields.into_draft()
    }

    /// 更新：未提供的字段沿用原值，合并结果整体重新校验
    pub fn merge_onto(self, ad: &Ad) -> Result<AdDraft> {
        let mut fields = Fields::from_ad(ad);
        self.apply(&mut fields)?;
        fields.into_draft()
    }

    /// 表单是否一个字段都没有提供
    pub fn is_empty(&self) -> bool {
        *self == AdForm::default()
    }

    fn apply(self, fields: &mut Fields) -> Result<()> {
        if let Some(title) = self.title {
            fields.title = title;
        }
        if let Some(description) = self.description {
            fields.description = Some(description);
        }
        if let Some(ad_type) = self.ad_type {
            fields.ad_type = parse_ad_type(&ad_type)?;
        }
        if let Some(media_url) = self.media_url {
            fields.media_url = Some(media_url);
        }
        if let Some(script) = self.google_ads_script {
            fields.script = Some(script);
        }
        if let Some(click_url) = self.click_url {
            fields.click_url = Some(click_url);
        }
        if let Some(open_new_tab) = self.open_new_tab {
            fields.open_new_tab = open_new_tab;
        }
        if let Some(duration) = self.duration {
            fields.duration = duration;
        }
        if let Some(slot) = self.slot_position {
            fields.slot = slot;
        }
        if let Some(is_active) = self.is_active {
            fields.is_active = is_active;
        }
        if let Some(start) = self.start_date {
            fields.start_date = parse_datetime("start_date", &start)?;
        }
        if let Some(end) = self.end_date {
            fields.end_date = parse_datetime("end_date", &end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn image_form() -> AdForm {
        AdForm {
            title: Some("Spring sale".into()),
            ad_type: Some("image".into()),
            media_url: Some("https://cdn.example.com/banner.png".into()),
            click_url: Some("https://shop.example.com".into()),
            ..Default::default()
        }
    }

    fn field_of(result: Result<AdDraft>) -> String {
        result.unwrap_err().field().unwrap_or_default().to_string()
    }

    #[test]
    fn test_image_defaults() {
        let draft = image_form().into_draft().unwrap();
        assert_eq!(draft.title, "Spring sale");
        assert_eq!(draft.slot, Slot::FIRST);
        assert!(draft.is_active);
        assert!(draft.creative.open_new_tab());
        assert_eq!(draft.window, ActiveWindow::unbounded());
    }

    #[test]
    fn test_title_length() {
        let mut form = image_form();
        form.title = Some("  ab ".into());
        assert_eq!(field_of(form.into_draft()), "title");

        let mut form = image_form();
        form.title = Some("x".repeat(256));
        assert_eq!(field_of(form.into_draft()), "title");

        assert_eq!(field_of(AdForm::default().into_draft()), "title");
    }

    #[test]
    fn test_per_type_required_fields() {
        let mut form = image_form();
        form.media_url = None;
        assert_eq!(field_of(form.into_draft()), "media_url");

        let mut form = image_form();
        form.click_url = Some("".into());
        assert_eq!(field_of(form.into_draft()), "click_url");

        let mut form = image_form();
        form.click_url = Some("not a url".into());
        assert_eq!(field_of(form.into_draft()), "click_url");

        let form = AdForm {
            title: Some("Network tag".into()),
            ad_type: Some("google_ads".into()),
            ..Default::default()
        };
        assert_eq!(field_of(form.into_draft()), "google_ads_script");
    }

    #[test]
    fn test_google_ads_needs_no_urls() {
        let form = AdForm {
            title: Some("Network tag".into()),
            ad_type: Some("GOOGLE_ADS".into()),
            google_ads_script: Some("<script>ads()</script>".into()),
            ..Default::default()
        };
        let draft = form.into_draft().unwrap();
        assert_eq!(draft.creative.ad_type(), AdType::GoogleAds);
        assert_eq!(draft.creative.click_url(), None);
    }

    #[test]
    fn test_slot_and_duration_bounds() {
        let mut form = image_form();
        form.slot_position = Some(6);
        assert_eq!(field_of(form.into_draft()), "slot_position");

        let mut form = image_form();
        form.ad_type = Some("video".into());
        form.duration = Some(-5);
        assert_eq!(field_of(form.into_draft()), "duration");

        let mut form = image_form();
        form.ad_type = Some("bogus".into());
        assert_eq!(field_of(form.into_draft()), "ad_type");
    }

    #[test]
    fn test_dates() {
        let mut form = image_form();
        form.start_date = Some("2026-05-01T08:30".into());
        form.end_date = Some("2026-06-01T00:00:00Z".into());
        let draft = form.into_draft().unwrap();
        assert_eq!(
            draft.window.starts_at,
            Some(Utc.with_ymd_and_hms(2026, 5, 1, 8, 30, 0).unwrap())
        );

        let mut form = image_form();
        form.start_date = Some("2026-06-02T00:00".into());
        form.end_date = Some("2026-06-01T00:00".into());
        assert_eq!(field_of(form.into_draft()), "end_date");

        let mut form = image_form();
        form.start_date = Some("next tuesday".into());
        assert_eq!(field_of(form.into_draft()), "start_date");
    }

    #[test]
    fn test_form_encoding_coercion() {
        let form: AdForm = serde_json::from_value(serde_json::json!({
            "title": "Video promo",
            "type": "video",
            "media_url": "/uploads/clip.mp4",
            "click_url": "https://example.com",
            "open_new_tab": "off",
            "is_active": "on",
            "duration": "15",
            "slot": "3",
            "description": ""
        }))
        .unwrap();

        assert_eq!(form.open_new_tab, Some(false));
        assert_eq!(form.is_active, Some(true));
        assert_eq!(form.duration, Some(15));
        assert_eq!(form.slot_position, Some(3));

        let draft = form.into_draft().unwrap();
        assert_eq!(draft.creative.duration_secs(), 15);
        assert_eq!(draft.slot.get(), 3);
        assert_eq!(draft.description, None);
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let parsed: std::result::Result<AdForm, _> =
            serde_json::from_value(serde_json::json!({ "is_active": "maybe" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let now = Utc::now();
        let ad = Ad {
            id: 7,
            title: "Original".into(),
            description: Some("desc".into()),
            creative: AdCreative::Image {
                media_url: "https://cdn.example.com/a.png".into(),
                click_url: "https://example.com".into(),
                open_new_tab: false,
            },
            slot: Slot::new(4).unwrap(),
            is_active: true,
            window: ActiveWindow {
                starts_at: Some(now),
                ends_at: None,
            },
            impressions_count: 10,
            clicks_count: 2,
            created_at: now,
            updated_at: now,
        };

        let form = AdForm {
            title: Some("Renamed".into()),
            start_date: Some("".into()),
            ..Default::default()
        };
        let draft = form.merge_onto(&ad).unwrap();
        assert_eq!(draft.title, "Renamed");
        assert_eq!(draft.description.as_deref(), Some("desc"));
        assert_eq!(draft.slot.get(), 4);
        assert!(!draft.creative.open_new_tab());
        assert_eq!(draft.window.starts_at, None);

        // 切换类型后合并结果整体校验
        let form = AdForm {
            ad_type: Some("google_ads".into()),
            ..Default::default()
        };
        assert_eq!(field_of(form.merge_onto(&ad)), "google_ads_script");
    }
}
