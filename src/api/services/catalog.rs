//! 商品目录端点（公开）

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::services::CatalogService;

use super::common::api_result;

pub async fn list_products(catalog: web::Data<Arc<CatalogService>>) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.list_products().await))
}

pub async fn get_product(
    catalog: web::Data<Arc<CatalogService>>,
    path: web::Path<i32>,
) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.get_product(path.into_inner()).await))
}

/// 商品路由 `/products`
pub fn catalog_routes() -> actix_web::Scope {
    web::scope("/products")
        .route("", web::get().to(list_products))
        .route("/{id}", web::get().to(get_product))
}

/// 首页：商品列表
pub fn home_route() -> actix_web::Resource {
    web::resource("/").route(web::get().to(list_products))
}
