use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, sea_query::Expr,
};

use super::SeaOrmStorage;
use super::converters::model_to_otp;
use crate::errors::{Result, ShoptrackError};
use crate::storage::models::OtpRecord;

use migration::entities::otp_code;

impl SeaOrmStorage {
    /// 作废同一邮箱、同一用途下所有未使用的验证码
    pub async fn invalidate_otps(&self, email: &str, purpose: &str) -> Result<u64> {
        let db = &self.db;
        let result = self
            .retry
            .run("invalidate_otps", || async {
                otp_code::Entity::update_many()
                    .col_expr(otp_code::Column::Consumed, Expr::value(true))
                    .filter(otp_code::Column::Email.eq(email))
                    .filter(otp_code::Column::Purpose.eq(purpose))
                    .filter(otp_code::Column::Consumed.eq(false))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("作废验证码失败: {}", e)))?;
        Ok(result.rows_affected)
    }

    pub async fn insert_otp(
        &self,
        email: &str,
        purpose: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpRecord> {
        let active = otp_code::ActiveModel {
            email: Set(email.to_string()),
            purpose: Set(purpose.to_string()),
            code_hash: Set(code_hash.to_string()),
            expires_at: Set(expires_at),
            attempts: Set(0),
            consumed: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let db = &self.db;
        let model = self
            .retry
            .run("insert_otp", || async { active.clone().insert(db).await })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("保存验证码失败: {}", e)))?;

        Ok(model_to_otp(model))
    }

    /// 最新的未使用且未过期的验证码
    pub async fn latest_active_otp(
        &self,
        email: &str,
        purpose: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>> {
        let model = otp_code::Entity::find()
            .filter(otp_code::Column::Email.eq(email))
            .filter(otp_code::Column::Purpose.eq(purpose))
            .filter(otp_code::Column::Consumed.eq(false))
            .filter(otp_code::Column::ExpiresAt.gt(now))
            .order_by_desc(otp_code::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询验证码失败: {}", e)))?;

        Ok(model.map(model_to_otp))
    }

    /// attempts + 1；达到上限时同时作废
    pub async fn record_otp_failure(&self, id: i32, max_attempts: i32) -> Result<i32> {
        let db = &self.db;
        self.retry
            .run(&format!("record_otp_failure({})", id), || async {
                otp_code::Entity::update_many()
                    .col_expr(
                        otp_code::Column::Attempts,
                        Expr::col(otp_code::Column::Attempts).add(1),
                    )
                    .filter(otp_code::Column::Id.eq(id))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("更新验证码失败: {}", e)))?;

        let attempts = otp_code::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询验证码失败: {}", e)))?
            .map(|m| m.attempts)
            .unwrap_or(max_attempts);

        if attempts >= max_attempts {
            self.consume_otp(id).await?;
        }
        Ok(attempts)
    }

    pub async fn consume_otp(&self, id: i32) -> Result<()> {
        let db = &self.db;
        self.retry
            .run(&format!("consume_otp({})", id), || async {
                otp_code::Entity::update_many()
                    .col_expr(otp_code::Column::Consumed, Expr::value(true))
                    .filter(otp_code::Column::Id.eq(id))
                    .exec(db)
                    .await
            })
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("更新验证码失败: {}", e)))?;
        Ok(())
    }
}
