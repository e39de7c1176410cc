use async_trait::async_trait;

use crate::storage::models::{Ad, ClickEvent, ImpressionEvent};

/// 计数器列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Impressions,
    Clicks,
}

/// 追踪事件的持久化接口
///
/// 由存储后端实现；测试中可替换为内存实现以覆盖降级路径。
#[async_trait]
pub trait TrackingSink: Send + Sync {
    /// 读取广告，用于记录前的资格检查
    async fn tracked_ad(&self, ad_id: i64) -> anyhow::Result<Option<Ad>>;

    /// 单个事务内写入曝光明细并把 impressions_count 加一
    async fn insert_impression(&self, event: &ImpressionEvent) -> anyhow::Result<()>;

    /// 单个事务内写入点击明细并把 clicks_count 加一
    async fn insert_click(&self, event: &ClickEvent) -> anyhow::Result<()>;

    /// 单条语句原子加一；返回 false 表示广告已不存在
    async fn bump_counter(&self, ad_id: i64, counter: Counter) -> anyhow::Result<bool>;
}
