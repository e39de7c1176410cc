//! Server mode
//!
//! This module contains the HTTP server startup logic.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::warn;

use crate::api::{self, AppState, middleware::RequestIdMiddleware};
use crate::config::{CorsConfig, StaticConfig, get_config};
use crate::runtime::lifetime;

/// 请求体上限，广告表单和 Google Ads 脚本都远小于此
const PAYLOAD_LIMIT: usize = 1024 * 1024;

/// CORS 允许的请求方法
const CORS_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "OPTIONS"];

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(cors_config: &CorsConfig) {
    if cors_config.enabled && cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig, user_id_header: &str) -> Cors {
    // 未启用时使用浏览器默认的同源策略
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default();
    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors.allowed_methods(CORS_METHODS)
        .allowed_header("Content-Type")
        .allowed_header("Authorization")
        .allowed_header("Accept")
        .allowed_header(user_id_header)
        .max_age(cors_config.max_age as usize)
}

fn bind_address(config: &StaticConfig) -> String {
    format!("{}:{}", config.server.host, config.server.port)
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config).await;
    let storage_for_shutdown = startup.storage().cloned();
    let state = AppState::new(&config, startup.availability);

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);
    let user_id_header = config.api.user_id_header.clone();

    if config.api.trusted_proxies.is_empty() {
        warn!(
            "Client IP detection: auto-detect mode. \
             Connections from private IPs will use X-Forwarded-For."
        );
    } else {
        warn!(
            "Client IP detection: trusted proxies configured: {:?}",
            config.api.trusted_proxies
        );
    }

    let server = HttpServer::new(move || {
        let cors = build_cors_middleware(&cors_config, &user_id_header);
        let state = state.clone();

        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .wrap(Compress::default())
            .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
            .app_data(web::JsonConfig::default().limit(PAYLOAD_LIMIT))
            .app_data(web::FormConfig::default().limit(PAYLOAD_LIMIT))
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .configure(|cfg| api::configure(cfg, &state))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let address = bind_address(&config);
    warn!("Starting server at http://{}", address);
    let server = server.bind(address)?.run();
    let handle = server.handle();

    tokio::select! {
        res = server => {
            res?;
            lifetime::shutdown::perform_shutdown(storage_for_shutdown).await;
        }
        _ = lifetime::shutdown::listen_for_shutdown(handle, storage_for_shutdown.clone()) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test as atest};

    #[actix_rt::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let cors_config = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://video.example.com".to_string()],
            max_age: 600,
        };
        let app = atest::init_service(
            App::new()
                .wrap(build_cors_middleware(&cors_config, "X-User-Id"))
                .route("/feed", web::get().to(|| async { "ok" })),
        )
        .await;

        let req = atest::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/feed")
            .insert_header(("Origin", "https://video.example.com"))
            .insert_header(("Access-Control-Request-Method", "GET"))
            .insert_header(("Access-Control-Request-Headers", "x-user-id"))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("https://video.example.com")
        );
    }

    #[test]
    fn test_bind_address() {
        let config = StaticConfig::default();
        assert_eq!(bind_address(&config), "127.0.0.1:8080");
    }
}
