//! User account persistence

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::{Expr, SimpleExpr},
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_user;
use crate::errors::{Result, ShoptrackError};
use crate::storage::models::User;

use migration::entities::user;

/// 新用户字段
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
    pub is_verified: bool,
}

impl SeaOrmStorage {
    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<User>> {
        let db = &self.db;
        let model = self.retry.run(&format!("find_user_by_id({})", id), || async {
            user::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("查询用户失败: {}", e)))?;

        Ok(model.map(model_to_user))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = self.retry.run("find_user_by_email", || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(db)
                .await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("查询用户失败: {}", e)))?;

        Ok(model.map(model_to_user))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("查询用户失败: {}", e)))?;

        Ok(model.map(model_to_user))
    }

    pub async fn insert_user(&self, new_user: NewUser<'_>) -> Result<User> {
        let active = user::ActiveModel {
            username: Set(new_user.username.to_string()),
            email: Set(new_user.email.to_string()),
            password_hash: Set(new_user.password_hash.to_string()),
            is_admin: Set(new_user.is_admin),
            is_verified: Set(new_user.is_verified),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let db = &self.db;
        let model = self
            .retry
            .run("insert_user", || async { active.clone().insert(db).await })
            .await
            .map_err(|e| {
            if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                ShoptrackError::validation("That username or email is already registered")
            } else {
                ShoptrackError::database_operation(format!("创建用户失败: {}", e))
            }
        })?;

        info!("User created: id={} username={}", model.id, model.username);
        Ok(model_to_user(model))
    }

    pub async fn mark_user_verified(&self, id: i32) -> Result<()> {
        self.update_user_column(id, user::Column::IsVerified, Expr::value(true))
            .await
    }

    pub async fn update_password_hash(&self, id: i32, password_hash: &str) -> Result<()> {
        self.update_user_column(id, user::Column::PasswordHash, Expr::value(password_hash))
            .await
    }

    /// 设置管理员标记，返回更新后的用户
    pub async fn set_admin_by_email(&self, email: &str, is_admin: bool) -> Result<User> {
        let Some(existing) = self.find_user_by_email(email).await? else {
            return Err(ShoptrackError::not_found(format!(
                "There is no account with email {}",
                email
            )));
        };

        self.update_user_column(existing.id, user::Column::IsAdmin, Expr::value(is_admin))
            .await?;

        Ok(User {
            is_admin,
            ..existing
        })
    }

    /// 返回 (总用户数, 已验证用户数)
    pub async fn count_users(&self) -> Result<(u64, u64)> {
        let total = user::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计用户失败: {}", e)))?;
        let verified = user::Entity::find()
            .filter(user::Column::IsVerified.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| ShoptrackError::database_operation(format!("统计用户失败: {}", e)))?;
        Ok((total, verified))
    }

    async fn update_user_column(&self, id: i32, column: user::Column, value: SimpleExpr) -> Result<()> {
        let db = &self.db;
        let result = self.retry.run(&format!("update_user({})", id), || async {
            user::Entity::update_many()
                .col_expr(column, value.clone())
                .filter(user::Column::Id.eq(id))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| ShoptrackError::database_operation(format!("更新用户失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(ShoptrackError::not_found(format!("用户不存在: {}", id)));
        }
        Ok(())
    }
}
