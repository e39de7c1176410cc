//! HTTP 接口
//!
//! - `services::public`: 前台拉取广告与点击 / 曝光上报
//! - `services::admin`: 需要 Bearer token 的管理接口
//! - `services::health`: 健康检查与子系统状态

pub mod extractors;
pub mod middleware;
pub mod services;

use actix_web::web;

use crate::config::StaticConfig;
use crate::services::AdsAvailability;
use extractors::ApiSettings;
use middleware::{AdminAuth, AvailabilityGuard};
use services::admin::ads_routes;
use services::{AppStartTime, health_routes, public_routes};

/// 注册路由所需的全部状态，每个 worker 克隆一份
#[derive(Clone)]
pub struct AppState {
    pub availability: AdsAvailability,
    pub settings: ApiSettings,
    pub api_prefix: String,
    pub admin_prefix: String,
    pub admin_token: String,
    pub start_time: AppStartTime,
}

impl AppState {
    pub fn new(config: &StaticConfig, availability: AdsAvailability) -> Self {
        Self {
            availability,
            settings: ApiSettings::from_config(config),
            api_prefix: config.routes.api_prefix.clone(),
            admin_prefix: config.routes.admin_prefix.clone(),
            admin_token: config.api.admin_token.clone(),
            start_time: AppStartTime::now(),
        }
    }
}

/// 注册 app_data 与全部路由
///
/// 子系统不可用时不注册 `AdsServices`，对应路由由 AvailabilityGuard 提前拦截。
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.availability.clone()))
        .app_data(web::Data::new(state.settings.clone()))
        .app_data(web::Data::new(state.start_time.clone()));
    if let Some(services) = state.availability.services() {
        cfg.app_data(web::Data::from(services.clone()));
    }

    cfg.service(
        health_routes(web::scope(&state.api_prefix))
            .service(public_routes().wrap(AvailabilityGuard)),
    )
    .service(
        web::scope(&state.admin_prefix)
            .wrap(AvailabilityGuard)
            .wrap(AdminAuth::new(&state.admin_token))
            .service(ads_routes()),
    );
}
