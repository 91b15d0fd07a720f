use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod models;
pub mod settings_store;

pub use backend::{NewUser, SeaOrmStorage};
pub use models::{
    CampaignState, ClickRecord, DashboardStats, ImportSummary, MailStatus, MailingEntry, NewClick,
    NewProduct, OtpRecord, Product, ShortUrl, StatusCounts, User,
};
pub use settings_store::SettingsStore;

pub struct StorageFactory;

impl StorageFactory {
    /// 按全局配置创建存储（连接 + 迁移）
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let storage = SeaOrmStorage::new(&config.database).await?;
        Ok(Arc::new(storage))
    }
}
