use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait, sea_query::OnConflict};
use tracing::debug;

use crate::errors::{Result, ShoptrackError};
use migration::entities::setting;

/// settings 表中的键
pub mod keys {
    /// Running / Paused
    pub const SCHEDULER_STATUS: &str = "scheduler_status";
    /// 发送间隔（分钟）
    pub const SCHEDULER_INTERVAL: &str = "scheduler_interval";
}

/// 无类型的键值存储（settings 表）
#[derive(Clone)]
pub struct SettingsStore {
    db: DatabaseConnection,
}

impl SettingsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 获取单个值
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let result = setting::Entity::find_by_id(key)
            .one(&self.db)
            .await
            .map_err(|e| {
                ShoptrackError::database_operation(format!(
                    "Failed to query setting '{}': {}",
                    key, e
                ))
            })?;

        Ok(result.map(|m| m.value))
    }

    /// 获取并解析为指定类型，解析失败视为数据错误
    pub async fn get_typed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(v) => v.trim().parse::<T>().map(Some).map_err(|_| {
                ShoptrackError::database_operation(format!(
                    "Failed to parse setting '{}' value '{}'",
                    key, v
                ))
            }),
            None => Ok(None),
        }
    }

    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_typed::<i64>(key).await
    }

    /// 写入（不存在则插入，存在则覆盖）
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let model = setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now()),
        };

        setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| {
                ShoptrackError::database_operation(format!(
                    "Failed to write setting '{}': {}",
                    key, e
                ))
            })?;

        debug!("Setting updated: {} = {}", key, value);
        Ok(())
    }
}
