//! Admin API 追踪链接端点

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::info;

use crate::api::constants::{DEFAULT_CLICK_LIMIT, MAX_PAGE_SIZE};
use crate::api::services::common::{
    ClicksQuery, CreateLinkBody, LinksQuery, MessageResponse, PageQuery, PaginatedData,
    PaginationInfo, api_result,
};
use crate::services::TrackingService;
use crate::utils::normalize_email;

pub async fn get_links(
    tracking: web::Data<Arc<TrackingService>>,
    query: web::Query<LinksQuery>,
) -> ActixResult<impl Responder> {
    let (page, page_size) = PageQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve();

    Ok(api_result(
        tracking
            .list_links(query.include_deleted, page, page_size)
            .await
            .map(|(items, total)| PaginatedData {
                items,
                pagination: PaginationInfo::new(page, page_size, total),
            }),
    ))
}

pub async fn create_link(
    tracking: web::Data<Arc<TrackingService>>,
    body: web::Json<CreateLinkBody>,
) -> ActixResult<impl Responder> {
    let email = body
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty());
    let result = tracking
        .generate_trackable_link(&body.long_url, email.as_deref())
        .await;
    if let Ok(ref url) = result {
        info!("Admin API: link created {}", url.short_code);
    }
    Ok(api_result(result))
}

pub async fn get_link_clicks(
    tracking: web::Data<Arc<TrackingService>>,
    path: web::Path<String>,
    query: web::Query<ClicksQuery>,
) -> ActixResult<impl Responder> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CLICK_LIMIT)
        .clamp(1, MAX_PAGE_SIZE * 10);
    Ok(api_result(tracking.link_clicks(&path, limit).await))
}

pub async fn delete_link(
    tracking: web::Data<Arc<TrackingService>>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let code = path.into_inner();
    Ok(api_result(
        tracking
            .soft_delete(&code)
            .await
            .map(|_| MessageResponse::new(format!("Link {} deleted", code))),
    ))
}
