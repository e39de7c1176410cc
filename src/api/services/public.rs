//! 前台广告接口
//!
//! 视频流在每次切换视频时调用 `/feed`，拿到广告后由前端渲染，
//! 用户点击时调用 `/{id}/click` 获取跳转地址（或直接使用 `/{id}/redirect`）。
//! 曝光和点击记录都是尽力而为，写入失败只记日志。

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::extractors::ClientContext;
use crate::api::services::admin::public_message;
use crate::config::get_config;
use crate::errors::AdError;
use crate::selection::FeedRequest;
use crate::services::AdsServices;
use crate::storage::models::Ad;
use crate::tracking::{RejectReason, TrackingOutcome, TrackingResult};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "videoIndex")]
    pub video_index: Option<String>,
    pub slot: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    #[serde(rename = "showAd")]
    pub show_ad: bool,
    pub slot: Option<u8>,
    pub data: Option<Ad>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PublicResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl PublicResponse<()> {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            field: None,
            data: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClickBody {
    pub referrer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImpressionBody {
    #[serde(rename = "videoIndex")]
    pub video_index: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickTarget {
    pub click_url: String,
    pub open_new_tab: bool,
}

fn json<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

fn error_json(err: &AdError) -> HttpResponse {
    if err.is_internal() {
        warn!("Public API error: {}", err);
    }
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json(
        status,
        &PublicResponse::<()> {
            field: err.field().map(str::to_string),
            ..PublicResponse::failure(public_message(err, get_config().is_production()))
        },
    )
}

/// 点击被拒绝时的响应；不存在 / 未启用为 404，其余为策略性拒绝
fn rejection(reason: RejectReason) -> HttpResponse {
    let status = match reason {
        RejectReason::NotFound | RejectReason::Inactive => StatusCode::NOT_FOUND,
        RejectReason::ExternalTracking | RejectReason::NoClickUrl => StatusCode::OK,
    };
    json(status, &PublicResponse::failure(reason.message()))
}

/// 从点击结果中取出跳转目标；无法跳转时返回对应的错误响应
fn click_target(result: TrackingResult) -> Result<ClickTarget, HttpResponse> {
    if let TrackingOutcome::Rejected(reason) = result.outcome {
        return Err(rejection(reason));
    }
    if result.outcome == TrackingOutcome::Failed {
        warn!("Click could not be recorded; serving target anyway");
    }
    let Some(ad) = result.ad else {
        return Err(error_json(&AdError::database_operation(
            "Failed to load ad for click",
        )));
    };
    match ad.creative.click_url() {
        Some(url) => Ok(ClickTarget {
            click_url: url.to_string(),
            open_new_tab: ad.creative.open_new_tab(),
        }),
        None => Err(rejection(RejectReason::NoClickUrl)),
    }
}

/// GET /feed?videoIndex=&slot=
pub async fn feed(
    query: web::Query<FeedQuery>,
    client: ClientContext,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let req = match FeedRequest::from_raw(query.video_index.as_deref(), query.slot.as_deref()) {
        Ok(req) => req,
        Err(e) => return error_json(&e),
    };

    match services.feed.next_ad(req, &client.0).await {
        Ok(decision) => {
            let message = match (&decision.ad, decision.slot()) {
                (Some(_), _) => "Ad served",
                (None, Some(_)) => "No ad for this position",
                (None, None) => "No ad scheduled for this video",
            };
            debug!(
                "Feed videoIndex={} -> {:?}, showAd={}",
                req.video_index,
                decision.placement,
                decision.show_ad()
            );
            json(
                StatusCode::OK,
                &FeedResponse {
                    success: true,
                    show_ad: decision.show_ad(),
                    slot: decision.slot().map(|s| s.get()),
                    data: decision.ad,
                    message: message.to_string(),
                },
            )
        }
        Err(e) => error_json(&e),
    }
}

/// POST /{id}/click，返回跳转地址
pub async fn click(
    path: web::Path<i64>,
    body: Option<web::Json<ClickBody>>,
    client: ClientContext,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let referrer = body.and_then(|b| b.into_inner().referrer);
    let event = client.0.click(path.into_inner(), referrer);
    let result = services.recorder.record_click(event).await;

    match click_target(result) {
        Ok(target) => json(
            StatusCode::OK,
            &PublicResponse {
                success: true,
                message: "Click recorded".to_string(),
                field: None,
                data: Some(target),
            },
        ),
        Err(response) => response,
    }
}

/// GET /{id}/redirect，记录点击后 302 到点击地址
pub async fn redirect(
    path: web::Path<i64>,
    client: ClientContext,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let event = client.0.click(path.into_inner(), None);
    let result = services.recorder.record_click(event).await;

    match click_target(result) {
        Ok(target) => HttpResponse::Found()
            .insert_header((LOCATION, target.click_url))
            .finish(),
        Err(response) if response.status() == StatusCode::OK => {
            // 无法跳转的广告对浏览器而言等同于不存在
            json(
                StatusCode::NOT_FOUND,
                &PublicResponse::failure("Ad has no click target"),
            )
        }
        Err(response) => response,
    }
}

/// POST /{id}/impression，供前端自行渲染广告后上报
pub async fn impression(
    path: web::Path<i64>,
    body: Option<web::Json<ImpressionBody>>,
    client: ClientContext,
    services: web::Data<AdsServices>,
) -> HttpResponse {
    let video_index = body.and_then(|b| b.into_inner().video_index);
    let event = client.0.impression(path.into_inner(), video_index);
    let result = services.recorder.record_impression(event).await;

    match result.outcome {
        TrackingOutcome::Rejected(reason) => rejection(reason),
        outcome => json(
            StatusCode::OK,
            &PublicResponse {
                success: outcome.recorded(),
                message: if outcome.recorded() {
                    "Impression recorded".to_string()
                } else {
                    "Impression not recorded".to_string()
                },
                field: None,
                data: Some(outcome),
            },
        ),
    }
}

/// 需要广告子系统可用的路由（由 AvailabilityGuard 包裹）
pub fn public_routes() -> actix_web::Scope {
    web::scope("")
        .route("/feed", web::get().to(feed))
        .route("/{id}/click", web::post().to(click))
        .route("/{id}/redirect", web::get().to(redirect))
        .route("/{id}/impression", web::post().to(impression))
}
