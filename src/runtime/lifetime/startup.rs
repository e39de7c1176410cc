use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::StaticConfig;
use crate::services::{AdsAvailability, AdsServices};
use crate::storage::{SeaOrmStorage, StorageFactory};

/// 服务启动上下文
///
/// 存储初始化失败不会阻止服务启动：健康检查和状态接口仍然可用，
/// 广告接口由可用性中间件返回 503。
pub struct StartupContext {
    pub availability: AdsAvailability,
}

impl StartupContext {
    pub fn storage(&self) -> Option<&Arc<SeaOrmStorage>> {
        self.availability.services().map(|s| &s.storage)
    }
}

/// 安装 rustls 加密提供者（Postgres/MySQL TLS 连接需要）
fn install_crypto_provider() {
    // 已安装时返回 Err，重复调用不视为错误
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> StartupContext {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    install_crypto_provider();

    let availability = match StorageFactory::create(&config.database).await {
        Ok(storage) => {
            info!("Using storage backend: {}", storage.backend_name());
            AdsAvailability::Available(Arc::new(AdsServices::new(storage)))
        }
        Err(e) => {
            error!("Ad storage initialization failed: {}", e);
            warn!("Starting in degraded mode: ad endpoints will return 503");
            AdsAvailability::unavailable(e.to_string())
        }
    };

    if config.api.admin_token.is_empty() {
        info!("Admin API is disabled (api.admin_token not set)");
    } else {
        info!(
            "Admin API available at: {}/ads",
            config.routes.admin_prefix.trim_end_matches('/')
        );
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    StartupContext { availability }
}

/// CLI 模式：存储不可用时直接失败
pub async fn prepare_cli_storage(config: &StaticConfig) -> crate::errors::Result<Arc<SeaOrmStorage>> {
    install_crypto_provider();
    StorageFactory::create(&config.database).await
}
