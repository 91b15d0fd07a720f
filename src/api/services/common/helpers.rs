//! HTTP API 帮助函数

use actix_web::HttpResponse;
use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::api::constants;
use crate::config::{AuthConfig, SameSitePolicy};
use crate::errors::ShoptrackError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// refresh cookie 只在认证路由下发送
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 ShoptrackError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_shoptrack(err: &ShoptrackError) -> HttpResponse {
    error_response(err.http_status(), ErrorCode::from(err), err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 ShoptrackError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<ShoptrackError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => {
            let err: ShoptrackError = e.into();
            error_from_shoptrack(&err)
        }
    }
}

/// 会话 Cookie 构建器
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    domain: Option<String>,
    access_token_minutes: u64,
    refresh_token_days: u64,
}

impl CookieBuilder {
    pub fn from_config() -> Self {
        Self::from_auth(&crate::config::get_config().auth)
    }

    pub fn from_auth(auth: &AuthConfig) -> Self {
        let same_site = match auth.cookie_same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };

        Self {
            same_site,
            secure: auth.cookie_secure,
            domain: auth.cookie_domain.clone(),
            access_token_minutes: auth.access_minutes(),
            refresh_token_days: auth.refresh_days(),
        }
    }

    fn build_cookie_base(
        &self,
        name: &'static str,
        value: String,
        path: &'static str,
        max_age: Duration,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path(path);
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        cookie.set_max_age(max_age);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    pub fn build_access_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::ACCESS_COOKIE_NAME,
            token,
            "/",
            Duration::minutes(self.access_token_minutes as i64),
        )
    }

    pub fn build_refresh_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::REFRESH_COOKIE_NAME,
            token,
            REFRESH_COOKIE_PATH,
            Duration::days(self.refresh_token_days as i64),
        )
    }

    pub fn build_expired_access_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(constants::ACCESS_COOKIE_NAME, String::new(), "/", Duration::ZERO)
    }

    pub fn build_expired_refresh_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::REFRESH_COOKIE_NAME,
            String::new(),
            REFRESH_COOKIE_PATH,
            Duration::ZERO,
        )
    }

    pub fn access_token_minutes(&self) -> u64 {
        self.access_token_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let response = success_response("success_data");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_from_shoptrack_maps_status() {
        let response = error_from_shoptrack(&ShoptrackError::not_found("gone"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_from_shoptrack(&ShoptrackError::forbidden("verify first"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_api_result_error_branch() {
        let result: Result<(), ShoptrackError> = Err(ShoptrackError::validation("bad"));
        assert_eq!(api_result(result).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cookies_follow_auth_config() {
        let auth = AuthConfig {
            cookie_secure: true,
            cookie_same_site: SameSitePolicy::Strict,
            cookie_domain: Some("shop.example.com".to_string()),
            ..Default::default()
        };
        let builder = CookieBuilder::from_auth(&auth);

        let access = builder.build_access_cookie("tok".to_string());
        assert_eq!(access.name(), constants::ACCESS_COOKIE_NAME);
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Strict));
        assert_eq!(access.domain(), Some("shop.example.com"));

        let refresh = builder.build_refresh_cookie("tok".to_string());
        assert_eq!(refresh.path(), Some(REFRESH_COOKIE_PATH));

        let expired = builder.build_expired_access_cookie();
        assert_eq!(expired.max_age(), Some(Duration::ZERO));
    }
}
