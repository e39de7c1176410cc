//! Mutation operations for SeaOrmStorage
//!
//! This module contains all admin-side write operations on `ads`.
//! Counter increments live in `tracking_sink.rs`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{draft_to_active_model, model_to_ad};
use super::retry;
use crate::errors::{AdError, Result};
use crate::storage::models::{ActiveWindow, Ad, AdDraft, copy_title};

use migration::entities::{ad, ad_click, ad_impression};

impl SeaOrmStorage {
    pub async fn create(&self, draft: &AdDraft) -> Result<Ad> {
        let model = draft_to_active_model(draft, Utc::now(), true)
            .insert(&self.db)
            .await
            .map_err(|e| AdError::database_operation(format!("创建广告失败: {}", e)))?;

        info!("Ad created: {} (slot {})", model.id, model.slot_position);
        Ok(model_to_ad(model))
    }

    /// 覆盖可编辑列；广告不存在时返回 None
    pub async fn update(&self, id: i64, draft: &AdDraft) -> Result<Option<Ad>> {
        let db = &self.db;
        let active = draft_to_active_model(draft, Utc::now(), false);

        let result = retry::with_retry(&format!("update({})", id), self.retry_config, || async {
            ad::Entity::update_many()
                .set(active.clone())
                .filter(ad::Column::Id.eq(id))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| AdError::database_operation(format!("更新广告失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!("Ad updated: {}", id);
        self.find_by_id(id).await
    }

    /// 删除广告及其曝光、点击明细（单个事务）
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AdError::database_operation(format!("开始事务失败: {}", e)))?;

        ad_click::Entity::delete_many()
            .filter(ad_click::Column::AdId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AdError::database_operation(format!("删除点击明细失败: {}", e)))?;

        ad_impression::Entity::delete_many()
            .filter(ad_impression::Column::AdId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AdError::database_operation(format!("删除曝光明细失败: {}", e)))?;

        let result = ad::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AdError::database_operation(format!("删除广告失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| AdError::database_operation(format!("提交事务失败: {}", e)))?;

        let deleted = result.rows_affected > 0;
        if deleted {
            info!("Ad deleted: {}", id);
        }
        Ok(deleted)
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<Option<Ad>> {
        let result = ad::Entity::update_many()
            .col_expr(ad::Column::IsActive, Expr::val(is_active))
            .col_expr(ad::Column::UpdatedAt, Expr::val(Utc::now()))
            .filter(ad::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AdError::database_operation(format!("更新广告状态失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// 原子翻转启用状态
    pub async fn toggle_active(&self, id: i64) -> Result<Option<Ad>> {
        let result = ad::Entity::update_many()
            .col_expr(ad::Column::IsActive, Expr::col(ad::Column::IsActive).not())
            .col_expr(ad::Column::UpdatedAt, Expr::val(Utc::now()))
            .filter(ad::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| AdError::database_operation(format!("切换广告状态失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let ad = self.find_by_id(id).await?;
        if let Some(ref ad) = ad {
            info!("Ad {} toggled, is_active = {}", id, ad.is_active);
        }
        Ok(ad)
    }

    /// 复制广告：素材与广告位照搬，新副本默认停用、不限时间窗口、计数器归零
    pub async fn clone_ad(&self, id: i64, title_override: Option<&str>) -> Result<Option<Ad>> {
        let Some(original) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let draft = AdDraft {
            title: title_override
                .map(str::to_string)
                .unwrap_or_else(|| copy_title(&original.title)),
            is_active: false,
            window: ActiveWindow::unbounded(),
            ..AdDraft::from(&original)
        };

        let copy = self.create(&draft).await?;
        info!("Ad {} cloned as {}", id, copy.id);
        Ok(Some(copy))
    }
}
