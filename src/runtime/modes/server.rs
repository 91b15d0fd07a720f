//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tokio::sync::watch;
use tracing::warn;

use crate::api::middleware::{RequestIdMiddleware, SessionAuth};
use crate::api::services::{
    AppStartTime, admin_v1_routes, auth_routes, catalog_routes, health_routes, home_route,
    redirect_routes,
};
use crate::runtime::lifetime;
use crate::runtime::lifetime::shutdown::BackgroundTasks;
use crate::runtime::lifetime::startup::RouteConfig;
use crate::services::{AppServices, spawn_campaign_scheduler};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_host: String,
    pub server_port: u16,
}

/// Build CORS middleware from configuration
///
/// 空列表：仅同源；`*`：任意来源但不携带凭证
fn build_cors_middleware(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::default();
    }

    if allowed_origins.iter().any(|o| o == "*") {
        return Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::ACCEPT,
        ])
        .supports_credentials()
        .max_age(3600);
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

/// 注册共享状态和全部路由
///
/// server 与集成测试共用，保证两边的路由表一致。
pub fn configure_app(cfg: &mut web::ServiceConfig, services: &AppServices, route: &RouteConfig) {
    cfg.app_data(web::Data::new(services.storage.clone()))
        .app_data(web::Data::new(services.jwt.clone()))
        .app_data(web::Data::new(services.identity.clone()))
        .app_data(web::Data::new(services.campaign.clone()))
        .app_data(web::Data::new(services.tracking.clone()))
        .app_data(web::Data::new(services.catalog.clone()))
        .app_data(web::PayloadConfig::new(1024 * 1024))
        .app_data(web::JsonConfig::default().limit(1024 * 1024))
        .service(
            web::scope("/api/v1")
                .service(auth_routes())
                .service(catalog_routes()),
        )
        .service(
            web::scope(&route.admin_prefix)
                .wrap(SessionAuth::admin())
                .service(admin_v1_routes()),
        )
        .service(web::scope(&route.health_prefix).service(health_routes()))
        .service(home_route())
        // 必须最后注册：/{code} 会匹配任意单段路径
        .service(redirect_routes());
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Prepares server components (storage, services, routes)
/// 3. Starts the embedded campaign scheduler when enabled
/// 4. Configures and starts the HTTP server
/// 5. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let services = startup.services.clone();
    let route = startup.route_config.clone();

    let config = crate::config::get_config();
    let server_config = ServerConfig {
        server_host: config.server.host.clone(),
        server_port: config.server.port,
    };

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let allowed_origins = config.server.cors_allowed_origins.clone();
    if allowed_origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin; credentials are disabled for cross-origin requests");
    }

    if config.server.trusted_proxies.is_empty() {
        warn!(
            "Rate limiting: Auto-detect mode enabled. \
             Connections from private IPs will use X-Forwarded-For. \
             To disable, configure server.trusted_proxies explicitly."
        );
    } else {
        warn!(
            "Rate limiting: Explicit trusted proxies configured: {:?}",
            config.server.trusted_proxies
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = config
        .campaign
        .embedded_scheduler
        .then(|| spawn_campaign_scheduler(services.campaign.clone(), shutdown_rx));

    let storage_for_shutdown = services.storage.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&allowed_origins))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(|cfg| configure_app(cfg, &services, &route))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!(
        "{}:{}",
        server_config.server_host, server_config.server_port
    );
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();

    let tasks = BackgroundTasks {
        shutdown_tx,
        scheduler,
    };

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&storage_for_shutdown, tasks) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
