//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法对用户密码和一次性验证码进行哈希和验证

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// 密码哈希错误
#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

/// 对密码进行 Argon2id 哈希
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// 验证密码是否匹配哈希
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 账户不存在时登录校验所用的占位哈希（进程内固定）
pub fn placeholder_hash() -> Option<&'static str> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| hash_password(&crate::utils::generate_secure_token(16)).ok())
        .as_deref()
}

/// 检测字符串是否是 Argon2 哈希格式
pub fn is_argon2_hash(s: &str) -> bool {
    s.starts_with("$argon2")
}

/// 校验新密码：至少 6 位，且与确认密码一致
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), String> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }
    if password != confirm {
        return Err("Passwords must match".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("hash should succeed");

        assert!(is_argon2_hash(&hash));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong_password", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_placeholder_hash_is_stable_and_rejects_guesses() {
        let first = placeholder_hash().expect("placeholder hash");
        assert!(is_argon2_hash(first));
        assert_eq!(placeholder_hash(), Some(first));
        assert!(!verify_password("hunter22", first).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("secret1", "secret1").is_ok());
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("secret1", "secret2").is_err());
    }
}
