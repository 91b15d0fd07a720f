use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum ShoptrackError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Unauthorized(String),
    Forbidden(String),
    TokenInvalid(String),
    MailDelivery(String),
    PasswordHash(String),
    CodeGeneration(String),
}

impl ShoptrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShoptrackError::DatabaseConfig(_) => "E001",
            ShoptrackError::DatabaseConnection(_) => "E002",
            ShoptrackError::DatabaseOperation(_) => "E003",
            ShoptrackError::FileOperation(_) => "E004",
            ShoptrackError::Validation(_) => "E005",
            ShoptrackError::NotFound(_) => "E006",
            ShoptrackError::Serialization(_) => "E007",
            ShoptrackError::Unauthorized(_) => "E008",
            ShoptrackError::Forbidden(_) => "E009",
            ShoptrackError::TokenInvalid(_) => "E010",
            ShoptrackError::MailDelivery(_) => "E011",
            ShoptrackError::PasswordHash(_) => "E012",
            ShoptrackError::CodeGeneration(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShoptrackError::DatabaseConfig(_) => "Database Configuration Error",
            ShoptrackError::DatabaseConnection(_) => "Database Connection Error",
            ShoptrackError::DatabaseOperation(_) => "Database Operation Error",
            ShoptrackError::FileOperation(_) => "File Operation Error",
            ShoptrackError::Validation(_) => "Validation Error",
            ShoptrackError::NotFound(_) => "Resource Not Found",
            ShoptrackError::Serialization(_) => "Serialization Error",
            ShoptrackError::Unauthorized(_) => "Unauthorized",
            ShoptrackError::Forbidden(_) => "Forbidden",
            ShoptrackError::TokenInvalid(_) => "Invalid Token",
            ShoptrackError::MailDelivery(_) => "Mail Delivery Error",
            ShoptrackError::PasswordHash(_) => "Password Hash Error",
            ShoptrackError::CodeGeneration(_) => "Short Code Generation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShoptrackError::DatabaseConfig(msg)
            | ShoptrackError::DatabaseConnection(msg)
            | ShoptrackError::DatabaseOperation(msg)
            | ShoptrackError::FileOperation(msg)
            | ShoptrackError::Validation(msg)
            | ShoptrackError::NotFound(msg)
            | ShoptrackError::Serialization(msg)
            | ShoptrackError::Unauthorized(msg)
            | ShoptrackError::Forbidden(msg)
            | ShoptrackError::TokenInvalid(msg)
            | ShoptrackError::MailDelivery(msg)
            | ShoptrackError::PasswordHash(msg)
            | ShoptrackError::CodeGeneration(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShoptrackError::Validation(_) => StatusCode::BAD_REQUEST,
            ShoptrackError::NotFound(_) => StatusCode::NOT_FOUND,
            ShoptrackError::Unauthorized(_) | ShoptrackError::TokenInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            ShoptrackError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShoptrackError::MailDelivery(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShoptrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShoptrackError {}

// 便捷的构造函数
impl ShoptrackError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::Serialization(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::Forbidden(msg.into())
    }

    pub fn token_invalid<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::TokenInvalid(msg.into())
    }

    pub fn mail_delivery<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::MailDelivery(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::PasswordHash(msg.into())
    }

    pub fn code_generation<T: Into<String>>(msg: T) -> Self {
        ShoptrackError::CodeGeneration(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShoptrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShoptrackError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for ShoptrackError {
    fn from(err: std::io::Error) -> Self {
        ShoptrackError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShoptrackError {
    fn from(err: serde_json::Error) -> Self {
        ShoptrackError::Serialization(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for ShoptrackError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        ShoptrackError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShoptrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            ShoptrackError::database_config("x"),
            ShoptrackError::database_connection("x"),
            ShoptrackError::database_operation("x"),
            ShoptrackError::file_operation("x"),
            ShoptrackError::validation("x"),
            ShoptrackError::not_found("x"),
            ShoptrackError::serialization("x"),
            ShoptrackError::unauthorized("x"),
            ShoptrackError::forbidden("x"),
            ShoptrackError::token_invalid("x"),
            ShoptrackError::mail_delivery("x"),
            ShoptrackError::password_hash("x"),
            ShoptrackError::code_generation("x"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ShoptrackError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ShoptrackError::not_found("gone").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ShoptrackError::forbidden("nope").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ShoptrackError::database_operation("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_format_simple() {
        let err = ShoptrackError::not_found("There is no account with that email");
        assert_eq!(
            err.format_simple(),
            "Resource Not Found: There is no account with that email"
        );
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_db_err() {
        let err: ShoptrackError = sea_orm::DbErr::Custom("oops".to_string()).into();
        assert_eq!(err.code(), "E003");
        assert!(err.message().contains("oops"));
    }
}
