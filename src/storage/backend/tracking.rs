//! Short URL and click log persistence

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{model_to_click, model_to_short_url};
use crate::errors::{Result, ShoptrackError};
use crate::storage::models::{ClickRecord, NewClick, ShortUrl};

use migration::entities::{click_log, short_url};

impl SeaOrmStorage {
    pub async fn short_code_exists(&self, code: &str) -> Result<bool> {
        let count = short_url::Entity::find()
            .filter(short_url::Column::ShortCode.eq(code))
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询短码失败: {}", e)))?;
        Ok(count > 0)
    }

    /// 插入短链接；短码撞上唯一索引时返回 Ok(None)
    pub async fn insert_short_url(
        &self,
        long_url: &str,
        code: &str,
        created_for_email: Option<&str>,
    ) -> Result<Option<ShortUrl>> {
        let active = short_url::ActiveModel {
            long_url: Set(long_url.to_string()),
            short_code: Set(code.to_string()),
            created_for_email: Set(created_for_email.map(str::to_string)),
            click_count: Set(0),
            is_deleted: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let db = &self.db;
        let inserted = self
            .retry
            .run(&format!("insert_short_url({})", code), || async {
                active.clone().insert(db).await
            })
            .await;

        match inserted {
            Ok(model) => {
                debug!("Short URL inserted: {} -> {}", model.short_code, model.long_url);
                Ok(Some(model_to_short_url(model)))
            }
            Err(e) if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Short code collision on insert: {}", code);
                Ok(None)
            }
            Err(e) => Err(ShoptrackError::database_operation(format!(
                "插入短链接失败: {}",
                e
            ))),
        }
    }

    /// 按短码查找（包含已软删除的行）
    pub async fn find_short_url(&self, code: &str) -> Result<Option<ShortUrl>> {
        let db = &self.db;
        let model = self.retry.run(&format!("find_short_url({})", code), || async {
            short_url::Entity::find()
                .filter(short_url::Column::ShortCode.eq(code))
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("查询短链接失败: {}", e)))?;

        Ok(model.map(model_to_short_url))
    }

    /// 写入点击记录并累加 click_count（同一事务）
    pub async fn record_click(&self, click: NewClick) -> Result<()> {
        let url_id = click.url_id;
        let db = &self.db;

        self.retry.run(&format!("record_click({})", url_id), || async {
            let txn = db.begin().await?;

            click_log::ActiveModel {
                url_id: Set(click.url_id),
                clicked_at: Set(click.clicked_at),
                ip_address: Set(click.ip_address.clone()),
                country: Set(click.country.clone()),
                city: Set(click.city.clone()),
                browser: Set(click.browser.clone()),
                platform: Set(click.platform.clone()),
                device_type: Set(click.device_type.clone()),
                referrer: Set(click.referrer.clone()),
                utm_source: Set(click.utm_source.clone()),
                utm_medium: Set(click.utm_medium.clone()),
                utm_campaign: Set(click.utm_campaign.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            short_url::Entity::update_many()
                .col_expr(
                    short_url::Column::ClickCount,
                    Expr::col(short_url::Column::ClickCount).add(1),
                )
                .filter(short_url::Column::Id.eq(url_id))
                .exec(&txn)
                .await?;

            txn.commit().await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("记录点击失败: {}", e)))
    }

    /// 分页列出短链接（新的在前），page 从 1 开始
    pub async fn list_short_urls(
        &self,
        include_deleted: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortUrl>, u64)> {
        let mut query = short_url::Entity::find();
        if !include_deleted {
            query = query.filter(short_url::Column::IsDeleted.eq(false));
        }

        let paginator = query
            .order_by_desc(short_url::Column::Id)
            .paginate(&self.db, std::cmp::Ord::max(page_size, 1));

        let total = paginator
            .num_items()
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计短链接失败: {}", e)))?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询短链接失败: {}", e)))?;

        Ok((models.into_iter().map(model_to_short_url).collect(), total))
    }

    /// 某短链接最近的点击记录
    pub async fn clicks_for_url(&self, url_id: i32, limit: u64) -> Result<Vec<ClickRecord>> {
        let models = click_log::Entity::find()
            .filter(click_log::Column::UrlId.eq(url_id))
            .order_by_desc(click_log::Column::ClickedAt)
            .order_by_desc(click_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询点击记录失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_click).collect())
    }

    /// 软删除；短码不存在或已删除时返回 NotFound
    pub async fn soft_delete_short_url(&self, code: &str) -> Result<()> {
        let db = &self.db;
        let result = self
            .retry
            .run(&format!("soft_delete_short_url({})", code), || async {
                short_url::Entity::update_many()
                    .col_expr(short_url::Column::IsDeleted, Expr::value(true))
                    .filter(short_url::Column::ShortCode.eq(code))
                    .filter(short_url::Column::IsDeleted.eq(false))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("删除短链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(ShoptrackError::not_found(format!("短链接不存在: {}", code)));
        }

        info!("Short URL soft-deleted: {}", code);
        Ok(())
    }

    /// 返回 (未删除的链接数, 点击日志总数)
    pub async fn tracking_totals(&self) -> Result<(u64, u64)> {
        let links = short_url::Entity::find()
            .filter(short_url::Column::IsDeleted.eq(false))
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计短链接失败: {}", e)))?;
        let clicks = click_log::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计点击失败: {}", e)))?;
        Ok((links, clicks))
    }
}
