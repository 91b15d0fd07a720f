//! 用户认证端点：注册、验证码、登录会话、密码重置

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::constants;
use crate::api::jwt::SessionClaims;
use crate::api::middleware::SessionAuth;
use crate::config::get_config;
use crate::services::{IdentityService, RegisterRequest};
use crate::utils::ip::{extract_forwarded_ip_from_headers, resolve_client_ip};

use super::common::{
    ApiResponse, AuthSuccessResponse, CookieBuilder, EmailBody, ErrorCode, LoginBody, MessageResponse,
    RegisterBody, ResetConfirmBody, VerifyOtpBody, api_result, error_from_shoptrack,
    error_response, json_response,
};

/// 基于客户端 IP 的限流 key 提取器
///
/// 仅在连接来自可信代理时采用转发头，规则与点击日志的 IP 提取一致。
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let conn_info = req.connection_info();
        let config = get_config();
        resolve_client_ip(
            conn_info.peer_addr(),
            extract_forwarded_ip_from_headers(req.headers()),
            &config.server.trusted_proxies,
        )
        .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract client IP"))
    }
}

/// 创建认证端点限流器（注册、登录、验证码、重置邮件各自独立计数）
///
/// 配置：每秒补充 1 个令牌，突发最多 5 次请求
/// 超限返回 HTTP 429 Too Many Requests
pub fn auth_rate_limiter() -> Governor<ClientIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Auth rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

pub async fn register(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<RegisterBody>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let result = identity
        .register(RegisterRequest {
            username: body.username,
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
        })
        .await;

    Ok(match result {
        Ok(user) => json_response(
            StatusCode::CREATED,
            ErrorCode::Success,
            "Your account has been created! A verification code was sent to your email.",
            Some(user),
        ),
        Err(e) => error_from_shoptrack(&e),
    })
}

pub async fn verify_otp(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<VerifyOtpBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(identity.verify_otp(&body.email, &body.code).await))
}

pub async fn resend_otp(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<EmailBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        identity
            .resend_otp(&body.email)
            .await
            .map(|_| MessageResponse::new("A new verification code has been sent.")),
    ))
}

pub async fn login(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<LoginBody>,
) -> ActixResult<impl Responder> {
    let outcome = match identity.login(&body.email, &body.password, body.remember).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok(error_from_shoptrack(&e)),
    };

    let cookie_builder = CookieBuilder::from_config();
    let mut response = HttpResponse::Ok();
    response.cookie(cookie_builder.build_access_cookie(outcome.access_token));
    if let Some(refresh) = outcome.refresh_token {
        response.cookie(cookie_builder.build_refresh_cookie(refresh));
    }

    Ok(response
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "Login successful".to_string(),
            data: Some(AuthSuccessResponse {
                user: outcome.user,
                expires_in: cookie_builder.access_token_minutes() * 60,
            }),
        }))
}

/// 登出 - 清除 cookies
pub async fn logout() -> ActixResult<impl Responder> {
    let cookie_builder = CookieBuilder::from_config();

    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_expired_access_cookie())
        .cookie(cookie_builder.build_expired_refresh_cookie())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data: Some(MessageResponse::new("Logout successful")),
        }))
}

/// 用 refresh cookie 换新的 access cookie
pub async fn refresh(
    req: HttpRequest,
    identity: web::Data<Arc<IdentityService>>,
) -> ActixResult<impl Responder> {
    let Some(refresh_token) = req
        .cookie(constants::REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
    else {
        warn!("Refresh token not found in cookie");
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Refresh token not found",
        ));
    };

    let (user, access_token) = match identity.refresh(&refresh_token).await {
        Ok(pair) => pair,
        Err(e) => return Ok(error_from_shoptrack(&e)),
    };

    let cookie_builder = CookieBuilder::from_config();
    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_access_cookie(access_token))
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "Token refreshed".to_string(),
            data: Some(AuthSuccessResponse {
                user,
                expires_in: cookie_builder.access_token_minutes() * 60,
            }),
        }))
}

/// 当前登录用户
pub async fn me(
    claims: web::ReqData<SessionClaims>,
    identity: web::Data<Arc<IdentityService>>,
) -> ActixResult<impl Responder> {
    let Some(user_id) = claims.user_id() else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenInvalid,
            "Malformed session token",
        ));
    };
    Ok(api_result(identity.current_user(user_id).await))
}

pub async fn request_password_reset(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<EmailBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        identity.request_password_reset(&body.email).await.map(|_| {
            MessageResponse::new(
                "An email has been sent with instructions to reset your password.",
            )
        }),
    ))
}

pub async fn confirm_password_reset(
    identity: web::Data<Arc<IdentityService>>,
    body: web::Json<ResetConfirmBody>,
) -> ActixResult<impl Responder> {
    let result = identity
        .reset_password(&body.token, &body.password, &body.confirm_password)
        .await;
    if result.is_ok() {
        info!("Password reset completed");
    }
    Ok(api_result(result.map(|_| {
        MessageResponse::new("Your password has been updated! You are now able to log in")
    })))
}

/// 认证路由 `/auth`
///
/// - POST /auth/register - 注册（带限流）
/// - POST /auth/verify-otp - 验证邮箱
/// - POST /auth/resend-otp - 重发验证码
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/logout - 登出
/// - POST /auth/refresh - 刷新 access cookie
/// - GET /auth/me - 当前用户（需登录）
/// - POST /auth/reset-password/request - 发送重置链接
/// - POST /auth/reset-password/confirm - 设置新密码
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route(
            "/register",
            web::post().to(register).wrap(auth_rate_limiter()),
        )
        .route(
            "/verify-otp",
            web::post().to(verify_otp).wrap(auth_rate_limiter()),
        )
        .route(
            "/resend-otp",
            web::post().to(resend_otp).wrap(auth_rate_limiter()),
        )
        .route("/login", web::post().to(login).wrap(auth_rate_limiter()))
        .route("/logout", web::post().to(logout))
        .route("/refresh", web::post().to(refresh))
        .service(
            web::resource("/me")
                .wrap(SessionAuth::user())
                .route(web::get().to(me)),
        )
        .route(
            "/reset-password/request",
            web::post()
                .to(request_password_reset)
                .wrap(auth_rate_limiter()),
        )
        .route(
            "/reset-password/confirm",
            web::post().to(confirm_password_reset),
        )
}
