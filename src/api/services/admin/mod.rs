//! Admin API 服务模块
//!
//! 该模块包含广告管理的所有端点：
//! - 广告 CRUD、启停、复制
//! - 按广告位分组与仪表盘汇总
//! - 单广告趋势统计
//! - 导出

mod ad_crud;
pub mod error_code;
mod helpers;
mod reports;
pub mod routes;
mod types;

pub use types::*;

pub use helpers::{
    INTERNAL_ERROR_MESSAGE, api_result, error_from_ad, error_response, public_message,
    success_response,
};

pub use error_code::ErrorCode;

pub use routes::ads_routes;
