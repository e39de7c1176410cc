//! Admin API 广告 CRUD 操作

use actix_web::{HttpResponse, Responder, web};
use tracing::{info, trace};

use crate::api::extractors::AdFormBody;
use crate::services::{AdsServices, parse_filter};

use super::helpers::{api_result, created_response, error_from_ad, paginated_response};
use super::types::{CloneAdRequest, DeletedResponse, ListAdsQuery};

/// 获取广告列表（支持分页和过滤）
pub async fn list_ads(
    query: web::Query<ListAdsQuery>,
    services: web::Data<AdsServices>,
) -> impl Responder {
    trace!("Admin API: list ads with filters: {:?}", query);

    let filter = match parse_filter(
        query.status.as_deref(),
        query.ad_type.as_deref(),
        query.slot.as_deref(),
        query.search.as_deref(),
    ) {
        Ok(filter) => filter,
        Err(e) => return error_from_ad(&e),
    };

    match services.ads.list(&filter, query.page, query.page_size).await {
        Ok(page) => {
            info!(
                "Admin API: returning {} ads (page {} of {}, total: {})",
                page.items.len(),
                page.page,
                page.total_pages(),
                page.total
            );
            paginated_response(page)
        }
        Err(e) => error_from_ad(&e),
    }
}

pub async fn create_ad(body: AdFormBody, services: web::Data<AdsServices>) -> HttpResponse {
    match services.ads.create(body.into_inner()).await {
        Ok(ad) => created_response("Ad created", ad),
        Err(e) => error_from_ad(&e),
    }
}

pub async fn get_ad(path: web::Path<i64>, services: web::Data<AdsServices>) -> HttpResponse {
    api_result(services.ads.get(path.into_inner()).await, "OK")
}

/// 部分更新，PUT 与 POST 共用（HTML 表单只能发 POST）
pub async fn update_ad(
    path: web::Path<i64>,
    body: AdFormBody,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    api_result(
        services.ads.update(path.into_inner(), body.into_inner()).await,
        "Ad updated",
    )
}

pub async fn delete_ad(path: web::Path<i64>, services: web::Data<AdsServices>) -> HttpResponse {
    let id = path.into_inner();
    api_result(
        services
            .ads
            .delete(id)
            .await
            .map(|()| DeletedResponse { id, deleted: true }),
        "Ad deleted",
    )
}

pub async fn toggle_ad(path: web::Path<i64>, services: web::Data<AdsServices>) -> HttpResponse {
    match services.ads.toggle(path.into_inner()).await {
        Ok(ad) => {
            let message = if ad.is_active {
                "Ad activated"
            } else {
                "Ad deactivated"
            };
            api_result(Ok(ad), message)
        }
        Err(e) => error_from_ad(&e),
    }
}

/// 请求体可省略；title 为空时使用 "<原标题> (Copy)"
pub async fn clone_ad(
    path: web::Path<i64>,
    body: Option<web::Json<CloneAdRequest>>,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let title = body.and_then(|b| b.into_inner().title);
    match services.ads.clone_ad(path.into_inner(), title.as_deref()).await {
        Ok(ad) => created_response("Ad cloned", ad),
        Err(e) => error_from_ad(&e),
    }
}
