//! 广告子系统的运行时句柄
//!
//! 启动时构建一次，通过 `web::Data` 注入到 handler。存储初始化失败时
//! 服务仍然启动，但子系统处于 `Unavailable`，由可用性中间件拦截请求。

use std::sync::Arc;

use super::AdService;
use crate::selection::FeedService;
use crate::storage::SeaOrmStorage;
use crate::tracking::{TrackingRecorder, TrackingSink};

/// 广告子系统的全部服务，共享同一个连接池
pub struct AdsServices {
    pub storage: Arc<SeaOrmStorage>,
    pub ads: AdService,
    pub feed: FeedService,
    pub recorder: Arc<TrackingRecorder>,
}

impl AdsServices {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        let sink: Arc<dyn TrackingSink> = storage.clone();
        let recorder = Arc::new(TrackingRecorder::new(sink));
        Self {
            ads: AdService::new(storage.clone()),
            feed: FeedService::new(storage.clone(), recorder.clone()),
            recorder,
            storage,
        }
    }
}

/// 子系统不可用时给运维的处理提示，503 响应与 /status 共用
pub const REMEDIATION: &str = "Check database.database_url and that the database is reachable, then restart the server. \
Schema migrations run automatically at startup.";

#[derive(Clone)]
pub enum AdsAvailability {
    Available(Arc<AdsServices>),
    Unavailable { reason: String },
}

impl AdsAvailability {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        AdsAvailability::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn services(&self) -> Option<&Arc<AdsServices>> {
        match self {
            AdsAvailability::Available(services) => Some(services),
            AdsAvailability::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.services().is_some()
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AdsAvailability::Available(_) => None,
            AdsAvailability::Unavailable { reason } => Some(reason),
        }
    }
}
