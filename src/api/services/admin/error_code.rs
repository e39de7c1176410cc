//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::AdError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 广告错误
/// - 4000-4099: 导出错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 广告错误 3000-3099
    AdNotFound = 3000,
    AdValidationFailed = 3001,
    AdDatabaseError = 3005,

    // 导出错误 4000-4099
    ExportFailed = 4001,
}

impl From<&AdError> for ErrorCode {
    fn from(err: &AdError) -> Self {
        match err {
            AdError::Validation { .. } => ErrorCode::AdValidationFailed,
            AdError::NotFound(_) => ErrorCode::AdNotFound,
            AdError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            AdError::DatabaseConfig(_)
            | AdError::DatabaseConnection(_)
            | AdError::DatabaseOperation(_) => ErrorCode::AdDatabaseError,
            AdError::Export(_) => ErrorCode::ExportFailed,
            AdError::Serialization(_) | AdError::FileOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}
