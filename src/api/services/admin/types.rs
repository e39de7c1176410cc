//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use super::error_code::ErrorCode;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    /// 校验失败的字段名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success,
            message: message.into(),
            field: None,
            data: Some(data),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            field: None,
            data: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListAdsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    pub slot: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    pub slot: Option<String>,
    pub search: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CloneAdRequest {
    pub title: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}
