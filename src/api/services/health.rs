//! 健康检查与子系统状态
//!
//! 这两个端点不经过可用性守卫：降级模式下也要能报告原因。

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::selection::SERVE_INTERVAL;
use crate::services::{AdsAvailability, REMEDIATION};
use crate::storage::models::SLOT_COUNT;

/// 数据库探测超时
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatabaseCheck {
    pub status: &'static str,
    pub backend: Option<String>,
    pub ads_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    pub database: DatabaseCheck,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SubsystemStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub ads: SubsystemStatus,
    pub serve_interval: u64,
    pub slot_count: u8,
}

async fn check_database(availability: &AdsAvailability) -> DatabaseCheck {
    let Some(services) = availability.services() else {
        return DatabaseCheck {
            status: "unavailable",
            backend: None,
            ads_count: None,
            error: availability.reason().map(str::to_string),
        };
    };
    let storage = &services.storage;
    let backend = Some(storage.backend_name().to_string());

    let probe = async {
        storage.ping().await?;
        storage.count().await
    };
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(count)) => {
            trace!("Database health check passed, {} ads", count);
            DatabaseCheck {
                status: "healthy",
                backend,
                ads_count: Some(count),
                error: None,
            }
        }
        Ok(Err(e)) => {
            error!("Database health check failed: {}", e);
            DatabaseCheck {
                status: "unhealthy",
                backend,
                ads_count: None,
                error: Some(e.message().to_string()),
            }
        }
        Err(_) => {
            error!("Database health check timeout");
            DatabaseCheck {
                status: "unhealthy",
                backend,
                ads_count: None,
                error: Some("timeout".to_string()),
            }
        }
    }
}

pub async fn health_check(
    availability: web::Data<AdsAvailability>,
    start_time: web::Data<AppStartTime>,
) -> HttpResponse {
    let started = Instant::now();
    let database = check_database(&availability).await;
    let healthy = database.status == "healthy";
    let now = chrono::Utc::now();

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: now.to_rfc3339(),
        uptime: (now - start_time.start_datetime).num_seconds().max(0) as u64,
        database,
        response_time_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "Health check completed in {:?}, status: {}",
        started.elapsed(),
        body.status
    );

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

pub async fn status(availability: web::Data<AdsAvailability>) -> HttpResponse {
    let available = availability.is_available();
    HttpResponse::Ok().json(StatusResponse {
        success: true,
        ads: SubsystemStatus {
            available,
            reason: availability.reason().map(str::to_string),
            remediation: (!available).then_some(REMEDIATION),
        },
        serve_interval: SERVE_INTERVAL,
        slot_count: SLOT_COUNT,
    })
}

/// Health 路由配置（挂在 api_prefix 下）
pub fn health_routes(scope: actix_web::Scope) -> actix_web::Scope {
    scope
        .route("/health", web::get().to(health_check))
        .route("/health", web::head().to(health_check))
        .route("/status", web::get().to(status))
}
