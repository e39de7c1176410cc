//! TrackingSink implementation for SeaOrmStorage
//!
//! Detail rows and counter increments are written in one transaction.
//! The counter-only path is a single `SET x = x + 1` statement, so
//! concurrent increments never lose updates.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait, ExprTrait,
    QueryFilter, TransactionTrait, sea_query::Expr,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::storage::models::{Ad, ClickEvent, ImpressionEvent};
use crate::tracking::{Counter, TrackingSink};

use migration::entities::{ad, ad_click, ad_impression};

fn counter_column(counter: Counter) -> ad::Column {
    match counter {
        Counter::Impressions => ad::Column::ImpressionsCount,
        Counter::Clicks => ad::Column::ClicksCount,
    }
}

/// 在事务内把计数器加一，广告不存在时报错以触发回滚
async fn increment_in(txn: &DatabaseTransaction, ad_id: i64, counter: Counter) -> anyhow::Result<()> {
    let column = counter_column(counter);
    let result = ad::Entity::update_many()
        .col_expr(column, Expr::col(column).add(Expr::val(1i64)))
        .filter(ad::Column::Id.eq(ad_id))
        .exec(txn)
        .await
        .context("Failed to increment counter")?;

    if result.rows_affected == 0 {
        anyhow::bail!("Ad {} not found while incrementing {:?}", ad_id, counter);
    }
    Ok(())
}

#[async_trait]
impl TrackingSink for SeaOrmStorage {
    async fn tracked_ad(&self, ad_id: i64) -> anyhow::Result<Option<Ad>> {
        self.find_by_id(ad_id).await.map_err(Into::into)
    }

    async fn insert_impression(&self, event: &ImpressionEvent) -> anyhow::Result<()> {
        let txn = self.db.begin().await.context("Failed to begin transaction")?;

        ad_impression::ActiveModel {
            ad_id: Set(event.ad_id),
            user_id: Set(event.user_id),
            ip_address: Set(event.ip_address.clone()),
            user_agent: Set(event.user_agent.clone()),
            video_index: Set(event.video_index),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert impression")?;

        increment_in(&txn, event.ad_id, Counter::Impressions).await?;

        txn.commit().await.context("Failed to commit impression")?;
        debug!("Impression recorded for ad {}", event.ad_id);
        Ok(())
    }

    async fn insert_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        let txn = self.db.begin().await.context("Failed to begin transaction")?;

        ad_click::ActiveModel {
            ad_id: Set(event.ad_id),
            user_id: Set(event.user_id),
            ip_address: Set(event.ip_address.clone()),
            user_agent: Set(event.user_agent.clone()),
            referrer: Set(event.referrer.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert click")?;

        increment_in(&txn, event.ad_id, Counter::Clicks).await?;

        txn.commit().await.context("Failed to commit click")?;
        debug!("Click recorded for ad {}", event.ad_id);
        Ok(())
    }

    async fn bump_counter(&self, ad_id: i64, counter: Counter) -> anyhow::Result<bool> {
        let db = &self.db;
        let column = counter_column(counter);

        let result = retry::with_retry(
            &format!("bump_counter({}, {:?})", ad_id, counter),
            self.retry_config,
            || async {
                ad::Entity::update_many()
                    .col_expr(column, Expr::col(column).add(Expr::val(1i64)))
                    .filter(ad::Column::Id.eq(ad_id))
                    .exec(db)
                    .await
            },
        )
        .await
        .context("Counter-only increment failed after retries")?;

        Ok(result.rows_affected > 0)
    }
}
