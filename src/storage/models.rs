use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// 广告位数量（slot 取值 1..=SLOT_COUNT）
pub const SLOT_COUNT: u8 = 5;

/// 标题最大长度（字符）
pub const TITLE_MAX_LEN: usize = 255;

/// 广告位编号，始终落在 1..=SLOT_COUNT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Slot(u8);

impl Slot {
    pub const FIRST: Slot = Slot(1);

    pub fn new(value: i64) -> Option<Self> {
        (1..=SLOT_COUNT as i64)
            .contains(&value)
            .then_some(Slot(value as u8))
    }

    /// 越界值收敛到最近的合法广告位（用于读取历史脏数据）
    pub fn clamped(value: i64) -> Self {
        Slot(value.clamp(1, SLOT_COUNT as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=SLOT_COUNT).map(Slot)
    }
}

impl TryFrom<i64> for Slot {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Slot::new(value).ok_or_else(|| format!("slot must be between 1 and {}", SLOT_COUNT))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 广告类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AdType {
    Image,
    Video,
    GoogleAds,
}

/// 启用状态过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdStatus {
    Active,
    Inactive,
}

/// 广告素材
///
/// 每种类型只携带对它有意义的字段：图片和视频必须有素材地址与点击地址，
/// 第三方广告只有脚本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ad_type", rename_all = "snake_case")]
pub enum AdCreative {
    Image {
        media_url: String,
        click_url: String,
        open_new_tab: bool,
    },
    Video {
        media_url: String,
        click_url: String,
        open_new_tab: bool,
        /// 0 = 不限时长
        #[serde(rename = "duration")]
        duration_secs: u32,
    },
    GoogleAds {
        #[serde(rename = "google_ads_script")]
        script: String,
    },
}

impl AdCreative {
    pub fn ad_type(&self) -> AdType {
        match self {
            AdCreative::Image { .. } => AdType::Image,
            AdCreative::Video { .. } => AdType::Video,
            AdCreative::GoogleAds { .. } => AdType::GoogleAds,
        }
    }

    /// 点击跳转地址；第三方广告或地址为空时返回 None
    pub fn click_url(&self) -> Option<&str> {
        match self {
            AdCreative::Image { click_url, .. } | AdCreative::Video { click_url, .. } => {
                Some(click_url.as_str()).filter(|u| !u.trim().is_empty())
            }
            AdCreative::GoogleAds { .. } => None,
        }
    }

    pub fn open_new_tab(&self) -> bool {
        match self {
            AdCreative::Image { open_new_tab, .. } | AdCreative::Video { open_new_tab, .. } => {
                *open_new_tab
            }
            AdCreative::GoogleAds { .. } => false,
        }
    }

    pub fn media_url(&self) -> Option<&str> {
        match self {
            AdCreative::Image { media_url, .. } | AdCreative::Video { media_url, .. } => {
                Some(media_url.as_str())
            }
            AdCreative::GoogleAds { .. } => None,
        }
    }

    pub fn script(&self) -> Option<&str> {
        match self {
            AdCreative::GoogleAds { script } => Some(script.as_str()),
            _ => None,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        match self {
            AdCreative::Video { duration_secs, .. } => *duration_secs,
            _ => 0,
        }
    }
}

/// 投放时间窗口，两端均为闭区间，None 表示不限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActiveWindow {
    #[serde(rename = "start_date")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(rename = "end_date")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl ActiveWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| end >= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub creative: AdCreative,
    #[serde(rename = "slot_position")]
    pub slot: Slot,
    pub is_active: bool,
    #[serde(flatten)]
    pub window: ActiveWindow,
    pub impressions_count: u64,
    pub clicks_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ad {
    pub fn ad_type(&self) -> AdType {
        self.creative.ad_type()
    }

    /// 启用且处于投放窗口内
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.window.contains(now)
    }

    pub fn ctr(&self) -> f64 {
        click_through_rate(self.clicks_count, self.impressions_count)
    }
}

/// 可编辑字段集合（创建与更新共用）
#[derive(Debug, Clone, PartialEq)]
pub struct AdDraft {
    pub title: String,
    pub description: Option<String>,
    pub creative: AdCreative,
    pub slot: Slot,
    pub is_active: bool,
    pub window: ActiveWindow,
}

impl From<&Ad> for AdDraft {
    fn from(ad: &Ad) -> Self {
        Self {
            title: ad.title.clone(),
            description: ad.description.clone(),
            creative: ad.creative.clone(),
            slot: ad.slot,
            is_active: ad.is_active,
            window: ad.window,
        }
    }
}

/// 列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct AdFilter {
    pub status: Option<AdStatus>,
    pub ad_type: Option<AdType>,
    pub slot: Option<Slot>,
    /// 模糊匹配标题或描述
    pub search: Option<String>,
}

/// 一次曝光事件
#[derive(Debug, Clone, Default)]
pub struct ImpressionEvent {
    pub ad_id: i64,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub video_index: Option<i64>,
}

/// 一次点击事件
#[derive(Debug, Clone, Default)]
pub struct ClickEvent {
    pub ad_id: i64,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_ads: u64,
    pub active_ads: u64,
    pub inactive_ads: u64,
    /// 启用且当前处于投放窗口内
    pub live_ads: u64,
    pub ads_by_type: BTreeMap<String, u64>,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ctr: f64,
}

impl DashboardSummary {
    /// 把按类型统计补齐为三种类型都存在
    pub fn fill_types(mut by_type: BTreeMap<String, u64>) -> BTreeMap<String, u64> {
        for t in AdType::iter() {
            by_type.entry(t.as_ref().to_string()).or_insert(0);
        }
        by_type
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
}

impl AnalyticsTotals {
    pub fn new(impressions: u64, clicks: u64) -> Self {
        Self {
            impressions,
            clicks,
            ctr: click_through_rate(clicks, impressions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdAnalytics {
    pub ad_id: i64,
    pub title: String,
    pub days: u32,
    /// 窗口内明细表统计
    pub window: AnalyticsTotals,
    /// 广告表上的累计计数器
    pub lifetime: AnalyticsTotals,
    pub daily: Vec<DailyBucket>,
}

/// 副本标题："<原标题> (Copy)"，原标题按字符截断以保证总长不超过 TITLE_MAX_LEN
pub fn copy_title(original: &str) -> String {
    const SUFFIX: &str = " (Copy)";
    let keep = TITLE_MAX_LEN - SUFFIX.chars().count();
    let base: String = original.trim().chars().take(keep).collect();
    format!("{}{}", base.trim_end(), SUFFIX)
}

/// 点击率（百分比，保留两位小数）；曝光为 0 时返回 0
pub fn click_through_rate(clicks: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        return 0.0;
    }
    (clicks as f64 / impressions as f64 * 10_000.0).round() / 100.0
}
