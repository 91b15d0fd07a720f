//! Trackable link service
//!
//! Short-code generation, redirect resolution and click logging with
//! user-agent and geolocation enrichment. Shared by the redirect handler,
//! the admin API and the campaign sender.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::geoip::GeoIpProvider;
use super::user_agent::classify_user_agent;
use crate::config::{AnalyticsConfig, TrackingConfig};
use crate::errors::{Result, ShoptrackError};
use crate::storage::{ClickRecord, NewClick, SeaOrmStorage, ShortUrl};
use crate::utils::ip::is_geo_lookup_candidate;
use crate::utils::url_validator::validate_target_url;
use crate::utils::{generate_random_code, is_valid_short_code};

/// 地址不在库中时写入的占位值
pub const UNKNOWN_LOCATION: &str = "Unknown";

// ============ Request DTOs ============

/// 一次点击的请求上下文
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

// ============ Service ============

pub struct TrackingService {
    storage: Arc<SeaOrmStorage>,
    geo: Option<GeoIpProvider>,
    config: TrackingConfig,
    enable_ip_logging: bool,
}

impl TrackingService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        geo: Option<GeoIpProvider>,
        config: TrackingConfig,
        analytics: &AnalyticsConfig,
    ) -> Self {
        Self {
            storage,
            geo,
            config,
            enable_ip_logging: analytics.enable_ip_logging,
        }
    }

    pub fn redirect_mode(&self) -> crate::config::RedirectMode {
        self.config.redirect_mode
    }

    /// 生成追踪短链接：随机短码，冲突则重试
    pub async fn generate_trackable_link(
        &self,
        long_url: &str,
        recipient_email: Option<&str>,
    ) -> Result<ShortUrl> {
        let target = validate_target_url(long_url).map_err(ShoptrackError::validation)?;
        let target = target.as_str();
        let attempts = self.config.max_generation_attempts.max(1);

        for attempt in 1..=attempts {
            let code = generate_random_code(self.config.code_length);
            if self.storage.short_code_exists(&code).await? {
                debug!("Short code {} taken (attempt {}/{})", code, attempt, attempts);
                continue;
            }

            // 并发插入仍可能撞上唯一索引
            if let Some(url) = self
                .storage
                .insert_short_url(target, &code, recipient_email)
                .await?
            {
                info!("Trackable link created: {} -> {}", url.short_code, url.long_url);
                return Ok(url);
            }
        }

        Err(ShoptrackError::code_generation(format!(
            "Failed to generate a unique short code after {} attempts",
            attempts
        )))
    }

    /// 查找未删除的短链接
    pub async fn resolve(&self, code: &str) -> Result<ShortUrl> {
        if !is_valid_short_code(code) {
            return Err(ShoptrackError::not_found(format!("Short link not found: {}", code)));
        }

        match self.storage.find_short_url(code).await? {
            Some(url) if !url.is_deleted => Ok(url),
            _ => Err(ShoptrackError::not_found(format!("Short link not found: {}", code))),
        }
    }

    /// 根据请求上下文构造点击记录
    pub async fn build_click(&self, url: &ShortUrl, ctx: &ClickContext) -> NewClick {
        let ua = ctx
            .user_agent
            .as_deref()
            .map(classify_user_agent)
            .unwrap_or_default();

        let (country, city) = match (&self.geo, ctx.ip.as_deref()) {
            (Some(geo), Some(ip)) if is_geo_lookup_candidate(ip) => match geo.lookup(ip).await {
                Ok(Some(info)) => (
                    Some(info.country.unwrap_or_else(|| UNKNOWN_LOCATION.to_string())),
                    Some(info.city.unwrap_or_else(|| UNKNOWN_LOCATION.to_string())),
                ),
                Ok(None) => (
                    Some(UNKNOWN_LOCATION.to_string()),
                    Some(UNKNOWN_LOCATION.to_string()),
                ),
                // 查询失败不等于"未收录"，留空
                Err(e) => {
                    warn!("GeoIP lookup for {} via {} failed: {}", ip, geo.provider_name(), e);
                    (None, None)
                }
            },
            _ => (None, None),
        };

        NewClick {
            url_id: url.id,
            clicked_at: Utc::now(),
            ip_address: if self.enable_ip_logging {
                ctx.ip.clone()
            } else {
                None
            },
            country,
            city,
            browser: Some(ua.browser),
            platform: Some(ua.platform),
            device_type: Some(ua.device_type.to_string()),
            referrer: non_empty(ctx.referrer.as_deref()),
            utm_source: non_empty(ctx.utm_source.as_deref()),
            utm_medium: non_empty(ctx.utm_medium.as_deref()),
            utm_campaign: non_empty(ctx.utm_campaign.as_deref()),
        }
    }

    pub async fn record_click(&self, url: &ShortUrl, ctx: &ClickContext) -> Result<()> {
        let click = self.build_click(url, ctx).await;
        if let Err(e) = self.storage.record_click(click).await {
            warn!("Failed to record click for {}: {}", url.short_code, e);
            return Err(e);
        }
        Ok(())
    }

    pub async fn list_links(
        &self,
        include_deleted: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortUrl>, u64)> {
        self.storage
            .list_short_urls(include_deleted, page, page_size)
            .await
    }

    /// 某个短码的点击日志（含已删除的短链接）
    pub async fn link_clicks(&self, code: &str, limit: u64) -> Result<Vec<ClickRecord>> {
        let url = self
            .storage
            .find_short_url(code)
            .await?
            .ok_or_else(|| ShoptrackError::not_found(format!("Short link not found: {}", code)))?;
        self.storage.clicks_for_url(url.id, limit).await
    }

    pub async fn soft_delete(&self, code: &str) -> Result<()> {
        self.storage.soft_delete_short_url(code).await?;
        info!("Short link soft-deleted: {}", code);
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" newsletter ")), Some("newsletter".to_string()));
    }
}
