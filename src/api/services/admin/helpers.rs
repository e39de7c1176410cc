//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::config::get_config;
use crate::errors::AdError;
use crate::services::AdPage;

use super::error_code::ErrorCode;
use super::types::{ApiResponse, PaginatedResponse, PaginationInfo};

/// 生产环境下 500 错误统一使用的提示
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &ApiResponse<T>) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 构建成功响应
pub fn success_response<T: Serialize>(message: &str, data: T) -> HttpResponse {
    json_response(StatusCode::OK, &ApiResponse::ok(message, data))
}

/// 201 Created
pub fn created_response<T: Serialize>(message: &str, data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, &ApiResponse::ok(message, data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, &ApiResponse::error(code, message))
}

/// 对外展示的错误消息；生产环境隐藏内部错误细节
pub fn public_message(err: &AdError, production: bool) -> String {
    if err.is_internal() && production {
        INTERNAL_ERROR_MESSAGE.to_string()
    } else {
        err.message().to_string()
    }
}

/// 从 AdError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_ad(err: &AdError) -> HttpResponse {
    if err.is_internal() {
        error!("Admin API error: {}", err);
    }
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ApiResponse::<()> {
        field: err.field().map(str::to_string),
        ..ApiResponse::error(
            ErrorCode::from(err),
            public_message(err, get_config().is_production()),
        )
    };
    json_response(status, &body)
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T, AdError>, message: &str) -> HttpResponse {
    match result {
        Ok(data) => success_response(message, data),
        Err(e) => error_from_ad(&e),
    }
}

/// 分页列表响应
pub fn paginated_response(page: AdPage) -> HttpResponse {
    let pagination = PaginationInfo {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages(),
    };
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            success: true,
            code: ErrorCode::Success,
            message: "OK".to_string(),
            data: page.items,
            pagination,
        })
}
