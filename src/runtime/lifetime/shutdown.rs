use actix_web::dev::ServerHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，停止 HTTP 服务后关闭连接池
pub async fn listen_for_shutdown(handle: ServerHandle, storage: Option<Arc<SeaOrmStorage>>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, closing resources...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    // 等待进行中的请求结束，之后才能安全关闭连接池
    handle.stop(true).await;
    info!("HTTP server stopped");

    perform_shutdown(storage).await;
}

/// 释放存储资源
///
/// 进行中的追踪写入要么在超时内完成，要么随连接池关闭而失败；
/// 追踪是尽力而为的，不阻塞退出。
pub async fn perform_shutdown(storage: Option<Arc<SeaOrmStorage>>) {
    let Some(storage) = storage else {
        info!("Ad storage was not initialized, nothing to close");
        return;
    };

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), storage.close()).await {
        Ok(Ok(())) => info!("All shutdown tasks completed successfully"),
        Ok(Err(e)) => warn!("Storage close reported an error: {}", e),
        Err(_) => error!(
            "Storage close timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
