//! SeaORM storage backend
//!
//! One `SeaOrmStorage` serves every table (users, mailing list, short URLs,
//! click logs, OTP codes, products). SQLite, MySQL/MariaDB and PostgreSQL
//! are supported; the backend is inferred from the URL.

mod connection;
mod converters;
mod mailing;
mod otp;
mod products;
pub mod retry;
mod tracking;
mod users;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShoptrackError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::parse_mail_status;
pub use users::NewUser;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
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
        Err(ShoptrackError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry: retry::RetryPolicy,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url.as_str();
        if database_url.is_empty() {
            return Err(ShoptrackError::database_config(
                "database_url 未设置".to_string(),
            ));
        }

        let backend_name = infer_backend_from_url(database_url)?;
        let retry = retry::RetryPolicy::from_config(config);

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry,
        };

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 获取数据库连接（settings 表等需要直接访问数据库的场景）
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 就绪探针：执行一次轻量查询
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| ShoptrackError::database_connection(format!("数据库不可用: {}", e)))
    }
}
