//! Service layer for business logic
//!
//! This module provides unified business logic that can be shared between
//! different interfaces (HTTP API, CLI, embedded scheduler).

pub mod campaign;
pub mod catalog;
pub mod dashboard;
pub mod geoip;
pub mod identity;
pub mod mailer;
pub mod otp;
pub mod scheduler;
pub mod templates;
pub mod tracking;
pub mod user_agent;

use std::sync::Arc;

use crate::api::jwt::JwtService;
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::storage::SeaOrmStorage;

pub use campaign::{CampaignService, CampaignStatus, ProcessOutcome};
pub use catalog::CatalogService;
pub use dashboard::collect_dashboard_stats;
pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider, GeoLookupError, GeoLookupResult};
pub use identity::{IdentityService, LoginOutcome, RegisterRequest};
pub use mailer::{EmailMessage, Mailer, mailer_from_config};
pub use otp::OtpService;
pub use scheduler::spawn_campaign_scheduler;
pub use tracking::{ClickContext, TrackingService};
pub use user_agent::{DeviceType, ParsedUserAgent, classify_user_agent};

/// 所有业务服务的集合（server / CLI 共用）
#[derive(Clone)]
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub jwt: Arc<JwtService>,
    pub identity: Arc<IdentityService>,
    pub campaign: Arc<CampaignService>,
    pub tracking: Arc<TrackingService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    /// 按配置构建，邮件发送方式由 `mail.provider` 决定
    pub fn build(storage: Arc<SeaOrmStorage>, config: &StaticConfig) -> Result<Self> {
        let mailer = mailer_from_config(&config.mail)?;
        let geo = GeoIpProvider::from_config(&config.analytics);
        Ok(Self::assemble(storage, config, mailer, geo))
    }

    /// 注入自定义 Mailer / GeoIP 实现
    pub fn assemble(
        storage: Arc<SeaOrmStorage>,
        config: &StaticConfig,
        mailer: Arc<dyn Mailer>,
        geo: Option<GeoIpProvider>,
    ) -> Self {
        let jwt = Arc::new(JwtService::from_auth_config(&config.auth));

        let tracking = Arc::new(TrackingService::new(
            storage.clone(),
            geo,
            config.tracking.clone(),
            &config.analytics,
        ));

        let otp = OtpService::new(storage.clone(), mailer.clone(), &config.auth);
        let identity = Arc::new(IdentityService::new(
            storage.clone(),
            otp,
            mailer.clone(),
            jwt.clone(),
            &config.server.public_base_url,
        ));

        let campaign = Arc::new(CampaignService::new(
            storage.clone(),
            tracking.clone(),
            mailer,
            config.campaign.clone(),
        ));

        let catalog = Arc::new(CatalogService::new(storage.clone()));

        Self {
            storage,
            jwt,
            identity,
            campaign,
            tracking,
            catalog,
        }
    }
}
