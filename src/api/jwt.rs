use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{
    AuthConfig, MAX_ACCESS_TOKEN_MINUTES, MAX_REFRESH_TOKEN_DAYS, MAX_RESET_TOKEN_MINUTES,
};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";
pub const TOKEN_TYPE_RESET: &str = "reset";

/// 会话 Token Claims（access / refresh 共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 用户 id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
    #[serde(default)]
    pub admin: bool,
}

impl SessionClaims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// 密码重置 Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
    /// 签发时密码哈希的指纹，改密后 token 自动失效
    pub fp: String,
}

/// JWT Service for generating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
    refresh_token_days: u64,
    reset_token_minutes: u64,
}

impl JwtService {
    pub fn new(
        secret: &str,
        access_token_minutes: u64,
        refresh_token_days: u64,
        reset_token_minutes: u64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes: access_token_minutes.clamp(1, MAX_ACCESS_TOKEN_MINUTES),
            refresh_token_days: refresh_token_days.clamp(1, MAX_REFRESH_TOKEN_DAYS),
            reset_token_minutes: reset_token_minutes.clamp(1, MAX_RESET_TOKEN_MINUTES),
        }
    }

    /// 从认证配置创建；未配置密钥时生成随机密钥（重启后会话全部失效）
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        let secret = if auth.jwt_secret.is_empty() {
            warn!("JWT secret not configured or empty, generating secure random token");
            crate::utils::generate_secure_token(32)
        } else {
            auth.jwt_secret.clone()
        };

        Self::new(
            &secret,
            auth.access_minutes(),
            auth.refresh_days(),
            auth.reset_minutes(),
        )
    }

    pub fn access_token_minutes(&self) -> u64 {
        self.access_token_minutes
    }

    pub fn refresh_token_days(&self) -> u64 {
        self.refresh_token_days
    }

    pub fn reset_token_minutes(&self) -> u64 {
        self.reset_token_minutes
    }

    fn session_claims(user_id: i32, admin: bool, token_type: &str, ttl: Duration) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
            admin,
        }
    }

    /// Generate Access Token (short-lived)
    pub fn generate_access_token(
        &self,
        user_id: i32,
        admin: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Self::session_claims(
            user_id,
            admin,
            TOKEN_TYPE_ACCESS,
            Duration::minutes(self.access_token_minutes as i64),
        );
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Generate Refresh Token (long-lived)
    pub fn generate_refresh_token(
        &self,
        user_id: i32,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Self::session_claims(
            user_id,
            false,
            TOKEN_TYPE_REFRESH,
            Duration::days(self.refresh_token_days as i64),
        );
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn generate_reset_token(
        &self,
        user_id: i32,
        fingerprint: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.reset_token_minutes as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: TOKEN_TYPE_RESET.to_string(),
            fp: fingerprint.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    fn validate_session(
        &self,
        token: &str,
        expected_type: &str,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != expected_type {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }

    pub fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        self.validate_session(token, TOKEN_TYPE_ACCESS)
    }

    pub fn validate_refresh_token(
        &self,
        token: &str,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        self.validate_session(token, TOKEN_TYPE_REFRESH)
    }

    pub fn validate_reset_token(
        &self,
        token: &str,
    ) -> Result<ResetClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<ResetClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.token_type != TOKEN_TYPE_RESET {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }
}
