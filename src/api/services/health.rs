use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

use super::common::{ErrorCode, json_response};

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u32,
}

/// Health Service
///
/// 直接调用 storage 的 ping，不经过业务服务，保证探针响应足够快。
pub struct HealthService;

impl HealthService {
    async fn check_storage(storage: &SeaOrmStorage) -> HealthStorageCheck {
        let backend = storage.backend_name().to_string();
        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HealthStorageCheck {
                status: "healthy".to_string(),
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some(format!("database error: {}", e)),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        }
    }

    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage_status = Self::check_storage(&storage).await;
        let is_healthy = storage_status.status == "healthy";
        let now = chrono::Utc::now();

        let health = HealthResponse {
            status: storage_status.status.clone(),
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            storage: storage_status,
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        if is_healthy {
            json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(health))
        } else {
            json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                "Service Unavailable",
                Some(health),
            )
        }
    }

    /// 就绪检查：数据库可用才返回 200
    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        trace!("Received readiness check request");
        let storage_status = Self::check_storage(&storage).await;
        if storage_status.status == "healthy" {
            HttpResponse::Ok().finish()
        } else {
            HttpResponse::ServiceUnavailable().finish()
        }
    }

    // 存活检查，只要进程能响应就返回 204
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::NoContent().finish()
    }
}

/// Health 路由
pub fn health_routes() -> actix_web::Scope {
    web::scope("")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
