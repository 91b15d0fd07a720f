//! Identity service
//!
//! Accounts, OTP-gated registration, cookie sessions and signed password
//! reset links. Shared by the HTTP API and the CLI.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{info, warn};
use xxhash_rust::xxh64::xxh64;

use super::mailer::Mailer;
use super::otp::{OtpService, PURPOSE_REGISTER};
use super::templates;
use crate::api::jwt::JwtService;
use crate::errors::{Result, ShoptrackError};
use crate::storage::{NewUser, SeaOrmStorage, User};
use crate::utils::password::{
    hash_password, placeholder_hash, validate_new_password, verify_password,
};
use crate::utils::{is_valid_email, normalize_email};

const USERNAME_MIN_CHARS: usize = 2;
const USERNAME_MAX_CHARS: usize = 20;

const LOGIN_FAILED: &str = "Login unsuccessful. Please check email and password.";
const INVALID_RESET_TOKEN: &str = "That is an invalid or expired token";

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    /// 仅在 remember = true 时签发
    pub refresh_token: Option<String>,
}

/// 密码哈希指纹（写入重置 token）
pub fn password_fingerprint(password_hash: &str) -> String {
    format!("{:016x}", xxh64(password_hash.as_bytes(), 0))
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ShoptrackError::validation(format!(
            "Username must be between {} and {} characters long",
            USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !is_valid_email(email) {
        return Err(ShoptrackError::validation("Invalid email address"));
    }
    Ok(())
}

pub struct IdentityService {
    storage: Arc<SeaOrmStorage>,
    otp: OtpService,
    mailer: Arc<dyn Mailer>,
    jwt: Arc<JwtService>,
    public_base_url: String,
}

impl IdentityService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        otp: OtpService,
        mailer: Arc<dyn Mailer>,
        jwt: Arc<JwtService>,
        public_base_url: &str,
    ) -> Self {
        Self {
            storage,
            otp,
            mailer,
            jwt,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn jwt(&self) -> &Arc<JwtService> {
        &self.jwt
    }

    async fn ensure_available(&self, username: &str, email: &str) -> Result<()> {
        if self.storage.find_user_by_username(username).await?.is_some() {
            return Err(ShoptrackError::validation(
                "That username is taken. Please choose a different one.",
            ));
        }
        if self.storage.find_user_by_email(email).await?.is_some() {
            return Err(ShoptrackError::validation(
                "That email is already registered. Please choose a different one.",
            ));
        }
        Ok(())
    }

    /// 注册：创建未验证用户并发送验证码
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let username = req.username.trim();
        let email = normalize_email(&req.email);

        validate_username(username)?;
        validate_email(&email)?;
        validate_new_password(&req.password, &req.confirm_password)
            .map_err(ShoptrackError::validation)?;
        self.ensure_available(username, &email).await?;

        let password_hash = hash_password(&req.password)?;
        let user = self
            .storage
            .insert_user(NewUser {
                username,
                email: &email,
                password_hash: &password_hash,
                is_admin: false,
                is_verified: false,
            })
            .await?;

        // 邮件失败不回滚账户，用户可通过 resend 重新获取
        if let Err(e) = self.otp.issue(&user.email, &user.username, PURPOSE_REGISTER).await {
            warn!("Registration OTP for {} not delivered: {}", user.email, e);
        }

        Ok(user)
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<User> {
        let email = normalize_email(email);
        let user = self
            .storage
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ShoptrackError::not_found("There is no account with that email."))?;

        if user.is_verified {
            return Ok(user);
        }

        self.otp.verify(&email, PURPOSE_REGISTER, code).await?;
        self.storage.mark_user_verified(user.id).await?;
        info!("User verified: {}", user.email);

        Ok(User {
            is_verified: true,
            ..user
        })
    }

    pub async fn resend_otp(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let user = self
            .storage
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ShoptrackError::not_found("There is no account with that email."))?;

        if user.is_verified {
            return Err(ShoptrackError::validation("This account is already verified."));
        }

        self.otp
            .issue(&user.email, &user.username, PURPOSE_REGISTER)
            .await
    }

    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            if let Some(hash) = placeholder_hash() {
                let _ = verify_password(password, hash);
            }
            return Err(ShoptrackError::unauthorized(LOGIN_FAILED));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!("Failed login for {}", email);
            return Err(ShoptrackError::unauthorized(LOGIN_FAILED));
        }

        if !user.is_verified {
            return Err(ShoptrackError::forbidden(
                "Please verify your email address before logging in.",
            ));
        }

        let access_token = self
            .jwt
            .generate_access_token(user.id, user.is_admin)
            .map_err(|e| ShoptrackError::token_invalid(format!("Failed to sign token: {}", e)))?;
        let refresh_token = if remember {
            Some(
                self.jwt.generate_refresh_token(user.id).map_err(|e| {
                    ShoptrackError::token_invalid(format!("Failed to sign token: {}", e))
                })?,
            )
        } else {
            None
        };

        info!("User logged in: {}", user.email);
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// 用 refresh token 换新的 access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, String)> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| ShoptrackError::token_invalid("Invalid or expired refresh token"))?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| ShoptrackError::token_invalid("Malformed refresh token"))?;
        let user = self.current_user(user_id).await?;

        let access_token = self
            .jwt
            .generate_access_token(user.id, user.is_admin)
            .map_err(|e| ShoptrackError::token_invalid(format!("Failed to sign token: {}", e)))?;
        Ok((user, access_token))
    }

    pub async fn current_user(&self, user_id: i32) -> Result<User> {
        self.storage
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ShoptrackError::unauthorized("Session user no longer exists"))
    }

    /// 生成带签名的重置链接并发送
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let user = self.storage.find_user_by_email(&email).await?.ok_or_else(|| {
            ShoptrackError::not_found("There is no account with that email. You must register first.")
        })?;

        let token = self
            .jwt
            .generate_reset_token(user.id, &password_fingerprint(&user.password_hash))
            .map_err(|e| ShoptrackError::token_invalid(format!("Failed to sign token: {}", e)))?;
        let reset_url = format!(
            "{}/reset-password?token={}",
            self.public_base_url,
            urlencoding::encode(&token)
        );

        let message = templates::password_reset_email(
            &user.email,
            &user.username,
            &reset_url,
            self.jwt.reset_token_minutes(),
        );
        self.mailer.send(&message).await?;

        info!("Password reset link sent to {}", user.email);
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let claims = self
            .jwt
            .validate_reset_token(token)
            .map_err(|_| ShoptrackError::token_invalid(INVALID_RESET_TOKEN))?;
        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| ShoptrackError::token_invalid(INVALID_RESET_TOKEN))?;
        let user = self
            .storage
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ShoptrackError::token_invalid(INVALID_RESET_TOKEN))?;

        let current = password_fingerprint(&user.password_hash);
        if !bool::from(current.as_bytes().ct_eq(claims.fp.as_bytes())) {
            return Err(ShoptrackError::token_invalid(INVALID_RESET_TOKEN));
        }

        validate_new_password(password, confirm_password).map_err(ShoptrackError::validation)?;
        let password_hash = hash_password(password)?;
        self.storage.update_password_hash(user.id, &password_hash).await?;

        info!("Password updated for {}", user.email);
        Ok(())
    }

    /// 直接创建已验证的管理员（CLI）
    pub async fn create_admin(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = normalize_email(email);

        validate_username(username)?;
        validate_email(&email)?;
        validate_new_password(password, password).map_err(ShoptrackError::validation)?;
        self.ensure_available(username, &email).await?;

        let password_hash = hash_password(password)?;
        let user = self
            .storage
            .insert_user(NewUser {
                username,
                email: &email,
                password_hash: &password_hash,
                is_admin: true,
                is_verified: true,
            })
            .await?;

        info!("Admin account created: {}", user.email);
        Ok(user)
    }

    pub async fn promote(&self, email: &str) -> Result<User> {
        let user = self
            .storage
            .set_admin_by_email(&normalize_email(email), true)
            .await?;
        info!("User promoted to admin: {}", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_bounds() {
        assert!(validate_username("a").is_err());
        assert!(validate_username("ab").is_ok());
        assert!(validate_username(&"x".repeat(20)).is_ok());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn test_fingerprint_changes_with_hash() {
        let a = password_fingerprint("$argon2id$v=19$first");
        let b = password_fingerprint("$argon2id$v=19$second");
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert_eq!(a, password_fingerprint("$argon2id$v=19$first"));
    }
}
