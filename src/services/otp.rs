//! Emailed one-time codes
//!
//! Codes are six digits, stored as Argon2 hashes with an expiry. Issuing a
//! new code burns every earlier unconsumed code for the same email and
//! purpose; too many wrong guesses burn the current one.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::mailer::Mailer;
use super::templates;
use crate::config::AuthConfig;
use crate::errors::{Result, ShoptrackError};
use crate::storage::SeaOrmStorage;
use crate::utils::generate_numeric_code;
use crate::utils::password::{hash_password, verify_password};

pub const OTP_LENGTH: usize = 6;
pub const PURPOSE_REGISTER: &str = "register";

pub struct OtpService {
    storage: Arc<SeaOrmStorage>,
    mailer: Arc<dyn Mailer>,
    ttl_minutes: u64,
    max_attempts: i32,
}

impl OtpService {
    pub fn new(storage: Arc<SeaOrmStorage>, mailer: Arc<dyn Mailer>, auth: &AuthConfig) -> Self {
        Self {
            storage,
            mailer,
            ttl_minutes: auth.otp_ttl(),
            max_attempts: auth.otp_max_attempts.max(1),
        }
    }

    /// 生成并发送验证码
    pub async fn issue(&self, email: &str, display_name: &str, purpose: &str) -> Result<()> {
        let burned = self.storage.invalidate_otps(email, purpose).await?;
        if burned > 0 {
            debug!("OTP: invalidated {} earlier codes for {}", burned, email);
        }

        let code = generate_numeric_code(OTP_LENGTH);
        let code_hash = hash_password(&code)?;
        let expires_at = Utc::now() + Duration::minutes(self.ttl_minutes as i64);
        self.storage
            .insert_otp(email, purpose, &code_hash, expires_at)
            .await?;

        let message = templates::otp_email(email, display_name, &code, self.ttl_minutes);
        self.mailer.send(&message).await?;

        info!("OTP issued for {} ({})", email, purpose);
        Ok(())
    }

    /// 校验验证码，成功后作废
    pub async fn verify(&self, email: &str, purpose: &str, code: &str) -> Result<()> {
        let code = code.trim();
        if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ShoptrackError::validation(format!(
                "The code must be exactly {} digits",
                OTP_LENGTH
            )));
        }

        let Some(record) = self
            .storage
            .latest_active_otp(email, purpose, Utc::now())
            .await?
        else {
            return Err(ShoptrackError::validation(
                "Invalid or expired code. Please request a new one.",
            ));
        };

        if verify_password(code, &record.code_hash)? {
            self.storage.consume_otp(record.id).await?;
            info!("OTP verified for {} ({})", email, purpose);
            return Ok(());
        }

        let attempts = self
            .storage
            .record_otp_failure(record.id, self.max_attempts)
            .await?;
        warn!(
            "OTP mismatch for {} ({}), attempt {}/{}",
            email, purpose, attempts, self.max_attempts
        );

        if attempts >= self.max_attempts {
            Err(ShoptrackError::validation(
                "Too many incorrect attempts. Please request a new code.",
            ))
        } else {
            Err(ShoptrackError::validation(
                "Invalid or expired code. Please request a new one.",
            ))
        }
    }
}
