use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{error, info, trace};

use crate::api::constants;
use crate::api::jwt::{JwtService, SessionClaims};
use crate::api::services::common::{ApiResponse, ErrorCode};

/// 会话认证中间件
///
/// 从 access cookie（或 `Authorization: Bearer`）读取 JWT，校验通过后把
/// [`SessionClaims`] 写入 request extensions，handler 用
/// `web::ReqData<SessionClaims>` 取出。
#[derive(Clone, Copy)]
pub struct SessionAuth {
    require_admin: bool,
}

impl SessionAuth {
    /// 任意已登录用户
    pub fn user() -> Self {
        Self {
            require_admin: false,
        }
    }

    /// 仅管理员
    pub fn admin() -> Self {
        Self {
            require_admin: true,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            require_admin: self.require_admin,
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    require_admin: bool,
}

impl<S, B> SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn reject(
        req: ServiceRequest,
        status: StatusCode,
        code: ErrorCode,
        message: &str,
    ) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::build(status)
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()> {
                    code: code as i32,
                    message: message.to_string(),
                    data: None,
                })
                .map_into_right_body(),
        )
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    }

    fn extract_token(req: &ServiceRequest) -> Option<String> {
        req.cookie(constants::ACCESS_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| Self::extract_bearer_token(req))
    }
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let require_admin = self.require_admin;

        Box::pin(async move {
            // Handle CORS preflight requests
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            let Some(jwt) = req.app_data::<web::Data<Arc<JwtService>>>().cloned() else {
                error!("JwtService is not registered as app data");
                return Ok(Self::reject(
                    req,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Authentication unavailable",
                ));
            };

            let Some(token) = Self::extract_token(&req) else {
                trace!("No session token on {}", req.path());
                return Ok(Self::reject(
                    req,
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::Unauthorized,
                    "Please log in to access this page.",
                ));
            };

            let claims: SessionClaims = match jwt.validate_access_token(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    info!("Session token validation failed: {}", e);
                    return Ok(Self::reject(
                        req,
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::TokenInvalid,
                        "Session expired or invalid",
                    ));
                }
            };

            if require_admin && !claims.admin {
                info!("Non-admin user {} denied on {}", claims.sub, req.path());
                return Ok(Self::reject(
                    req,
                    StatusCode::FORBIDDEN,
                    ErrorCode::Forbidden,
                    "Admin access required",
                ));
            }

            trace!("Session authenticated for user {}", claims.sub);
            req.extensions_mut().insert(claims);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
