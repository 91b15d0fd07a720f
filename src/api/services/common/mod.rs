//! 响应信封、错误码与请求/响应类型（各路由模块共用）

pub mod error_code;
mod helpers;
mod types;

pub use error_code::ErrorCode;
pub use helpers::{
    CookieBuilder, REFRESH_COOKIE_PATH, api_result, error_from_shoptrack, error_response,
    json_response, success_response,
};
pub use types::*;
