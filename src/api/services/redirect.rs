use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error, trace};

use crate::config::RedirectMode;
use crate::errors::ShoptrackError;
use crate::services::templates::escape_html;
use crate::services::{ClickContext, TrackingService};
use crate::storage::ShortUrl;
use crate::utils::ip::extract_client_ip;
use crate::utils::is_valid_short_code;

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        tracking: web::Data<Arc<TrackingService>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if !is_valid_short_code(&code) {
            trace!("Invalid short code rejected: {}", &code);
            return Self::not_found_response();
        }

        let url = match tracking.resolve(&code).await {
            Ok(url) => url,
            Err(ShoptrackError::NotFound(_)) => {
                debug!("Redirect link not found: {}", &code);
                return Self::not_found_response();
            }
            Err(e) => {
                error!("Database error during redirect lookup: {}", e);
                return Self::error_response();
            }
        };

        // 点击写入失败不影响跳转
        let ctx = Self::click_context(&req);
        if let Err(e) = tracking.record_click(&url, &ctx).await {
            error!("Click for {} not recorded: {}", url.short_code, e);
        }

        Self::finish_redirect(&url, tracking.redirect_mode())
    }

    /// 从请求中提取点击上下文
    fn click_context(req: &HttpRequest) -> ClickContext {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(String::from)
        };
        let query = req.uri().query().unwrap_or_default();

        ClickContext {
            ip: extract_client_ip(req),
            user_agent: header("user-agent"),
            referrer: header("referer"),
            utm_source: Self::extract_query_param(query, "utm_source"),
            utm_medium: Self::extract_query_param(query, "utm_medium"),
            utm_campaign: Self::extract_query_param(query, "utm_campaign"),
        }
    }

    /// 从 query string 提取指定参数值
    #[inline]
    fn extract_query_param(query: &str, key: &str) -> Option<String> {
        for part in query.split('&') {
            if let Some(value) = part.strip_prefix(key).and_then(|s| s.strip_prefix('=')) {
                return urlencoding::decode(&value.replace('+', " "))
                    .ok()
                    .map(|v| v.into_owned());
            }
        }
        None
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }

    fn finish_redirect(url: &ShortUrl, mode: RedirectMode) -> HttpResponse {
        match mode {
            RedirectMode::Redirect => HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header(("Location", url.long_url.as_str()))
                .finish(),
            RedirectMode::Interstitial => HttpResponse::build(StatusCode::OK)
                .insert_header(("Content-Type", "text/html; charset=utf-8"))
                .body(interstitial_page(&url.long_url)),
        }
    }
}

/// 中转页：meta refresh 立即跳转，附带手动链接
pub fn interstitial_page(target: &str) -> String {
    let target = escape_html(target);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta http-equiv="refresh" content="0; url={target}">
    <title>Redirecting...</title>
</head>
<body>
    <p>Redirecting... If you are not redirected, <a href="{target}">click here</a>.</p>
</body>
</html>"#
    )
}

/// 短链接跳转路由（必须最后注册）
pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{code}")
        .route(web::get().to(RedirectService::handle_redirect))
        .route(web::head().to(RedirectService::handle_redirect))
}
