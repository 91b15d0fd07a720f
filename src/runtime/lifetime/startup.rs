use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{StaticConfig, get_config};
use crate::services::AppServices;
use crate::storage::StorageFactory;

pub struct StartupContext {
    pub services: AppServices,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub admin_prefix: String,
    pub health_prefix: String,
}

/// 安装 rustls 加密提供者（GeoIP 外部 API、Webhook 邮件网关共用）
///
/// 重复安装返回错误，CLI 和 server 都会调用，因此忽略已安装的情况。
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// 连接存储并构建所有业务服务（server / CLI 共用）
pub async fn build_services() -> Result<AppServices> {
    install_crypto_provider();

    let config = get_config();
    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    AppServices::build(storage, &config).context("Failed to build services")
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let services = build_services().await?;

    let config = get_config();
    let route_config = RouteConfig {
        admin_prefix: config.server.admin_prefix.clone(),
        health_prefix: config.server.health_prefix.clone(),
    };

    check_component_enabled(&config, &route_config);

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        services,
        route_config,
    })
}

fn check_component_enabled(config: &Arc<StaticConfig>, route_config: &RouteConfig) {
    check_jwt_secret_security(config);

    if !config.auth.cookie_secure {
        warn!(
            "WARNING: Cookie Secure flag is disabled. \
            Cookies will be sent over unencrypted HTTP connections. \
            Enable auth.cookie_secure=true for production environments."
        );
    }

    info!("Admin API available at: {}", route_config.admin_prefix);
    info!("Health API available at: {}", route_config.health_prefix);

    if config.campaign.embedded_scheduler {
        info!("Embedded campaign scheduler is enabled");
    } else {
        info!("Embedded campaign scheduler is disabled, use `shoptrack send-batch` from cron");
    }
}

/// 检查 JWT Secret 安全性
fn check_jwt_secret_security(config: &StaticConfig) {
    let jwt_secret = &config.auth.jwt_secret;
    if jwt_secret.is_empty() {
        warn!("WARNING: auth.jwt_secret is not set. Sessions will not survive a restart.");
    } else if jwt_secret.len() < 32 {
        warn!(
            "WARNING: JWT Secret is too short ({} bytes). \
            Recommended minimum is 32 bytes for security.",
            jwt_secret.len()
        );
    }
}
