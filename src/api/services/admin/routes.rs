//! Admin API 路由配置

use actix_web::web;

use super::ad_crud::{clone_ad, create_ad, delete_ad, get_ad, list_ads, toggle_ad, update_ad};
use super::reports::{ad_analytics, ads_by_slot, dashboard, export_ads};

/// 广告管理路由 `/ads`
///
/// 包含：
/// - GET /ads - 分页列表
/// - POST /ads - 创建（JSON 或表单）
/// - GET /ads/slots - 按广告位分组
/// - GET /ads/dashboard - 汇总
/// - GET /ads/export - 导出 CSV / JSON
/// - GET /ads/{id} - 详情
/// - PUT|POST /ads/{id} - 部分更新
/// - DELETE /ads/{id}, POST /ads/{id}/delete - 删除
/// - POST /ads/{id}/toggle - 切换启用状态
/// - POST /ads/{id}/clone - 复制
/// - GET /ads/{id}/analytics - 按天趋势
pub fn ads_routes() -> actix_web::Scope {
    web::scope("/ads")
        .route("", web::get().to(list_ads))
        .route("", web::post().to(create_ad))
        // 固定路径必须在 /{id} 之前
        .route("/slots", web::get().to(ads_by_slot))
        .route("/dashboard", web::get().to(dashboard))
        .route("/export", web::get().to(export_ads))
        .route("/{id}/toggle", web::post().to(toggle_ad))
        .route("/{id}/clone", web::post().to(clone_ad))
        .route("/{id}/delete", web::post().to(delete_ad))
        .route("/{id}/analytics", web::get().to(ad_analytics))
        .route("/{id}", web::get().to(get_ad))
        .route("/{id}", web::put().to(update_ad))
        .route("/{id}", web::post().to(update_ad))
        .route("/{id}", web::delete().to(delete_ad))
}
