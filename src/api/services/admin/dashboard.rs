use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::services::common::api_result;
use crate::services::{CatalogService, collect_dashboard_stats};
use crate::storage::{NewProduct, SeaOrmStorage};

/// 后台首页统计
pub async fn get_dashboard(storage: web::Data<Arc<SeaOrmStorage>>) -> ActixResult<impl Responder> {
    Ok(api_result(collect_dashboard_stats(&storage).await))
}

pub async fn create_product(
    catalog: web::Data<Arc<CatalogService>>,
    body: web::Json<NewProduct>,
) -> ActixResult<impl Responder> {
    Ok(api_result(catalog.create_product(body.into_inner()).await))
}
