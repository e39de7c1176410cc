//! 广告子系统可用性守卫
//!
//! 存储初始化失败时服务照常监听，但广告相关路由统一返回 503。
//! 浏览器请求（Accept 偏好 text/html）拿到一个简短的 HTML 页面，
//! 其余请求拿到 JSON。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;
use std::rc::Rc;
use tracing::warn;

use crate::services::{AdsAvailability, REMEDIATION};

const RETRY_AFTER_SECS: &str = "30";

const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Ads temporarily unavailable</title></head>
<body>
<h1>Ads temporarily unavailable</h1>
<p>The ad service could not reach its database. Content is unaffected; please try again shortly.</p>
<p>Operators: check database.database_url and that the database is reachable, then restart the server.</p>
</body>
</html>
"#;

/// Accept 中 text/html 是否排在 application/json 之前
pub fn prefers_html(accept: Option<&str>) -> bool {
    let Some(accept) = accept else {
        return false;
    };
    let position = |needle: &str| accept.find(needle);
    match (position("text/html"), position("application/json")) {
        (Some(html), Some(json)) => html < json,
        (Some(_), None) => true,
        _ => false,
    }
}

#[derive(Clone, Default)]
pub struct AvailabilityGuard;

impl<S, B> Transform<S, ServiceRequest> for AvailabilityGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AvailabilityGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AvailabilityGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AvailabilityGuardMiddleware<S> {
    service: Rc<S>,
}

fn unavailable_response(req: &ServiceRequest, reason: &str) -> HttpResponse {
    let accept = req.headers().get(ACCEPT).and_then(|h| h.to_str().ok());
    if prefers_html(accept) {
        return HttpResponse::ServiceUnavailable()
            .insert_header((CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((RETRY_AFTER, RETRY_AFTER_SECS))
            .body(FALLBACK_PAGE);
    }
    HttpResponse::ServiceUnavailable()
        .insert_header((RETRY_AFTER, RETRY_AFTER_SECS))
        .json(json!({
            "success": false,
            "code": crate::api::services::admin::ErrorCode::ServiceUnavailable,
            "message": format!("Ad service unavailable: {}", reason),
            "remediation": REMEDIATION,
        }))
}

impl<S, B> Service<ServiceRequest> for AvailabilityGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            let reason = match req.app_data::<web::Data<AdsAvailability>>() {
                Some(availability) => availability.reason().map(str::to_string),
                None => Some("not initialized".to_string()),
            };

            if let Some(reason) = reason {
                warn!("Rejecting {} {}: ads unavailable ({})", req.method(), req.path(), reason);
                let response = unavailable_response(&req, &reason);
                return Ok(req.into_response(response.map_into_right_body()));
            }

            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test as atest};

    #[test]
    fn test_prefers_html() {
        assert!(prefers_html(Some("text/html,application/xhtml+xml,*/*;q=0.8")));
        assert!(!prefers_html(Some("application/json, text/html")));
        assert!(!prefers_html(Some("*/*")));
        assert!(!prefers_html(None));
    }

    #[actix_rt::test]
    async fn test_unavailable_returns_503() {
        let app = atest::init_service(
            App::new()
                .app_data(web::Data::new(AdsAvailability::unavailable("db down")))
                .service(
                    web::scope("/api")
                        .wrap(AvailabilityGuard)
                        .route("/feed", web::get().to(HttpResponse::Ok)),
                ),
        )
        .await;

        let resp = atest::call_service(&app, atest::TestRequest::get().uri("/api/feed").to_request()).await;
        assert_eq!(resp.status(), 503);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], 1030);
        assert_eq!(body["remediation"], REMEDIATION);

        let req = atest::TestRequest::get()
            .uri("/api/feed")
            .insert_header((ACCEPT, "text/html"))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), 503);
        let body = atest::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("<h1>"));
    }
}
