//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//! All SQL for ads and their tracking tables lives under this module.

mod analytics;
mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod tracking_sink;

use sea_orm::{DatabaseConnection, DbBackend};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::errors::{AdError, Result};

pub use analytics::{DEFAULT_ANALYTICS_DAYS, MAX_ANALYTICS_DAYS, clamp_days};
pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{draft_to_active_model, model_to_ad};
pub use query::MAX_PAGE_SIZE;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AdError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// MariaDB 的 URL 前缀 sqlx 不认识，统一改写为 mysql://
fn normalize_database_url(database_url: &str) -> String {
    match database_url.strip_prefix("mariadb://") {
        Some(rest) => format!("mysql://{}", rest),
        None => database_url.to_string(),
    }
}

/// SeaORM-based storage backend
///
/// Owns the connection pool. Built explicitly from configuration, shared via
/// `Arc`, and torn down with [`SeaOrmStorage::close`].
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url.trim();
        if database_url.is_empty() {
            return Err(AdError::database_config("database_url 未设置"));
        }

        let backend_name = normalize_backend_name(&infer_backend_from_url(database_url)?);
        let retry_config = retry::RetryConfig {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config).await?
        } else {
            connect_generic(&normalize_database_url(database_url), &backend_name, config).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry_config,
        };

        run_migrations(&storage.db).await?;

        info!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn db_backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    /// 获取数据库连接（用于健康检查等需要直接访问数据库的场景）
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 探测数据库连通性
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| AdError::database_connection(format!("数据库不可达: {}", e)))
    }

    /// 关闭连接池
    ///
    /// 连接池在所有克隆之间共享，关闭后任何克隆都不可再使用。
    pub async fn close(&self) -> Result<()> {
        match self.db.clone().close().await {
            Ok(()) => {
                info!("{} connection pool closed", self.backend_name.to_uppercase());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to close connection pool: {}", e);
                Err(AdError::database_connection(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://ads.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("ads.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/ads").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://localhost/ads").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_normalize_database_url() {
        assert_eq!(
            normalize_database_url("mariadb://u@h/db"),
            "mysql://u@h/db"
        );
        assert_eq!(normalize_database_url("sqlite://x.db"), "sqlite://x.db");
    }
}
