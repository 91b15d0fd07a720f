//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ShoptrackError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 短链接错误
/// - 4000-4099: 邮件活动错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    DatabaseError = 1006,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,
    AccountNotVerified = 2005,

    // 短链接错误 3000-3099
    LinkNotFound = 3000,
    LinkInvalidUrl = 3002,
    LinkCodeGenerationFailed = 3007,

    // 邮件活动错误 4000-4099
    MailDeliveryFailed = 4000,
    ImportFailed = 4001,
}

impl From<&ShoptrackError> for ErrorCode {
    fn from(err: &ShoptrackError) -> Self {
        match err {
            ShoptrackError::Validation(_) => ErrorCode::BadRequest,
            ShoptrackError::NotFound(_) => ErrorCode::NotFound,
            ShoptrackError::Unauthorized(_) => ErrorCode::AuthFailed,
            ShoptrackError::Forbidden(_) => ErrorCode::Forbidden,
            ShoptrackError::TokenInvalid(_) => ErrorCode::TokenInvalid,
            ShoptrackError::MailDelivery(_) => ErrorCode::MailDeliveryFailed,
            ShoptrackError::CodeGeneration(_) => ErrorCode::LinkCodeGenerationFailed,
            ShoptrackError::DatabaseConfig(_)
            | ShoptrackError::DatabaseConnection(_)
            | ShoptrackError::DatabaseOperation(_) => ErrorCode::DatabaseError,
            ShoptrackError::FileOperation(_)
            | ShoptrackError::Serialization(_)
            | ShoptrackError::PasswordHash(_) => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(serde_json::to_string(&ErrorCode::AuthFailed).unwrap(), "2000");
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ErrorCode::from(&ShoptrackError::validation("x")),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ErrorCode::from(&ShoptrackError::database_operation("x")),
            ErrorCode::DatabaseError
        );
        assert_eq!(
            ErrorCode::from(&ShoptrackError::code_generation("x")),
            ErrorCode::LinkCodeGenerationFailed
        );
    }
}
