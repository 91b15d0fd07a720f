//! Mailing list persistence
//!
//! The status column is only ever written with `MailStatus` literals; the
//! final Pending → Sent/Failed write is conditional on the row still being
//! Pending.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{model_to_mailing_entry, parse_mail_status};
use crate::errors::{Result, ShoptrackError};
use crate::storage::models::{MailStatus, MailingEntry, StatusCounts};

use migration::entities::mailing_list;

impl SeaOrmStorage {
    /// 返回已存在于 mailing_list 中的地址
    pub async fn existing_mailing_emails(&self, emails: &[String]) -> Result<HashSet<String>> {
        if emails.is_empty() {
            return Ok(HashSet::new());
        }

        let mut found = HashSet::new();
        // 避免单条 SQL 参数过多
        for chunk in emails.chunks(500) {
            let rows: Vec<String> = mailing_list::Entity::find()
                .select_only()
                .column(mailing_list::Column::Email)
                .filter(mailing_list::Column::Email.is_in(chunk.iter().cloned()))
                .into_tuple::<String>()
                .all(&self.db)
                .await
                .map_err(|e| {
                    ShoptrackError::database_operation(format!("查询邮件列表失败: {}", e))
                })?;
            found.extend(rows);
        }
        Ok(found)
    }

    /// 在一个事务中插入新的 Pending 行，返回插入条数
    pub async fn insert_mailing_entries(&self, emails: &[String]) -> Result<usize> {
        if emails.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let db = &self.db;
        self.retry
            .run("insert_mailing_entries", || async {
                let txn = db.begin().await?;
                for chunk in emails.chunks(200) {
                    let models: Vec<mailing_list::ActiveModel> = chunk
                        .iter()
                        .map(|email| mailing_list::ActiveModel {
                            email: Set(email.clone()),
                            status: Set(MailStatus::Pending.as_ref().to_string()),
                            sent_date: Set(None),
                            created_at: Set(now),
                            ..Default::default()
                        })
                        .collect();
                    mailing_list::Entity::insert_many(models).exec(&txn).await?;
                }
                txn.commit().await
            })
            .await
            .map_err(|e| {
                ShoptrackError::database_operation(format!("批量插入邮件列表失败: {}", e))
            })?;

        info!("Mailing list: inserted {} new entries", emails.len());
        Ok(emails.len())
    }

    /// id 最小的 Pending 行
    pub async fn next_pending_entry(&self) -> Result<Option<MailingEntry>> {
        let db = &self.db;
        let model = self.retry.run("next_pending_entry", || async {
            mailing_list::Entity::find()
                .filter(mailing_list::Column::Status.eq(MailStatus::Pending.as_ref()))
                .order_by_asc(mailing_list::Column::Id)
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("查询待发送邮件失败: {}", e)))?;

        model.map(model_to_mailing_entry).transpose()
    }

    /// 将 Pending 行写为最终状态；返回 false 表示该行已被其他进程处理
    pub async fn finalize_mailing_entry(
        &self,
        id: i32,
        status: MailStatus,
        sent_date: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let db = &self.db;
        let result = self.retry.run(&format!("finalize_mailing_entry({})", id), || async {
                mailing_list::Entity::update_many()
                    .col_expr(mailing_list::Column::Status, Expr::value(status.as_ref()))
                    .col_expr(mailing_list::Column::SentDate, Expr::value(sent_date))
                    .filter(mailing_list::Column::Id.eq(id))
                    .filter(mailing_list::Column::Status.eq(MailStatus::Pending.as_ref()))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("更新邮件状态失败: {}", e)))?;

        debug!(
            "Mailing entry {} -> {} (rows affected: {})",
            id, status, result.rows_affected
        );
        Ok(result.rows_affected == 1)
    }

    /// Failed → Pending，返回影响行数
    pub async fn reset_failed_entries(&self) -> Result<u64> {
        let db = &self.db;
        let result = self
            .retry
            .run("reset_failed_entries", || async {
                mailing_list::Entity::update_many()
                    .col_expr(
                        mailing_list::Column::Status,
                        Expr::value(MailStatus::Pending.as_ref()),
                    )
                    .col_expr(
                        mailing_list::Column::SentDate,
                        Expr::value(Option::<DateTime<Utc>>::None),
                    )
                    .filter(mailing_list::Column::Status.eq(MailStatus::Failed.as_ref()))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("重置失败邮件失败: {}", e)))?;

        info!("Mailing list: {} failed entries re-queued", result.rows_affected);
        Ok(result.rows_affected)
    }

    pub async fn mailing_status_counts(&self) -> Result<StatusCounts> {
        let rows: Vec<(String, i64)> = mailing_list::Entity::find()
            .select_only()
            .column(mailing_list::Column::Status)
            .column_as(mailing_list::Column::Id.count(), "count")
            .group_by(mailing_list::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计邮件状态失败: {}", e)))?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let count = std::cmp::Ord::max(count, 0) as u64;
            match parse_mail_status(&status)? {
                MailStatus::Pending => counts.pending = count,
                MailStatus::Sent => counts.sent = count,
                MailStatus::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }

    /// 分页列出邮件列表，page 从 1 开始
    pub async fn list_mailing_entries(
        &self,
        status: Option<MailStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<MailingEntry>, u64)> {
        let mut query = mailing_list::Entity::find();
        if let Some(status) = status {
            query = query.filter(mailing_list::Column::Status.eq(status.as_ref()));
        }

        let paginator = query
            .order_by_asc(mailing_list::Column::Id)
            .paginate(&self.db, std::cmp::Ord::max(page_size, 1));

        let total = paginator
            .num_items()
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计邮件列表失败: {}", e)))?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询邮件列表失败: {}", e)))?;

        let entries = models
            .into_iter()
            .map(model_to_mailing_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok((entries, total))
    }
}
