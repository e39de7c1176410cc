//! 请求上下文提取器

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::http::header::{REFERER, USER_AGENT};
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::api::services::admin::{ErrorCode, error_response};
use crate::config::StaticConfig;
use crate::services::AdForm;
use crate::tracking::ClientInfo;
use crate::utils::ip::extract_client_ip;

/// user_agent / referrer 的最大保留长度
const MAX_HEADER_VALUE_LEN: usize = 512;

/// 接口层用到的配置快照，启动时从 `StaticConfig` 构建并注册为 app_data
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub trusted_proxies: Vec<String>,
    pub user_id_header: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

impl ApiSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            trusted_proxies: config.api.trusted_proxies.clone(),
            user_id_header: config.api.user_id_header.clone(),
        }
    }
}

fn header_str(req: &HttpRequest, name: impl actix_web::http::header::AsHeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(MAX_HEADER_VALUE_LEN).collect())
}

/// 客户端上下文：IP、User-Agent、可选用户 ID、Referer
pub struct ClientContext(pub ClientInfo);

impl ClientContext {
    pub fn from_request(req: &HttpRequest, settings: &ApiSettings) -> ClientInfo {
        let user_id = req
            .headers()
            .get(settings.user_id_header.as_str())
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        ClientInfo {
            ip_address: extract_client_ip(req, &settings.trusted_proxies),
            user_agent: header_str(req, USER_AGENT),
            user_id,
            referrer: header_str(req, REFERER),
        }
    }
}

impl FromRequest for ClientContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let info = match req.app_data::<web::Data<ApiSettings>>() {
            Some(settings) => ClientContext::from_request(req, settings),
            None => ClientContext::from_request(req, &ApiSettings::default()),
        };
        ready(Ok(ClientContext(info)))
    }
}

/// 广告表单请求体：`application/x-www-form-urlencoded` 按表单解析，其余按 JSON
pub struct AdFormBody(pub AdForm);

impl AdFormBody {
    pub fn into_inner(self) -> AdForm {
        self.0
    }
}

fn bad_body(err: actix_web::Error) -> actix_web::Error {
    debug!("Rejecting ad form body: {}", err);
    let message = format!("Invalid request body: {}", err);
    let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
    InternalError::from_response(message, response).into()
}

impl FromRequest for AdFormBody {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type() == "application/x-www-form-urlencoded" {
            let fut = web::Form::<AdForm>::from_request(req, payload);
            Box::pin(async move {
                fut.await
                    .map(|form| AdFormBody(form.into_inner()))
                    .map_err(bad_body)
            })
        } else {
            let fut = web::Json::<AdForm>::from_request(req, payload);
            Box::pin(async move {
                fut.await
                    .map(|json| AdFormBody(json.into_inner()))
                    .map_err(bad_body)
            })
        }
    }
}
