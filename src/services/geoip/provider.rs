//! GeoIP Provider 抽象层
//!
//! 根据配置选择实现：
//! 1. enable_geo_lookup = false → 不做查询
//! 2. maxminddb_path 配置且文件可读 → MaxMindProvider
//! 3. 否则 → ExternalApiProvider

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::external_api::ExternalApiProvider;
use super::maxmind::MaxMindProvider;
use crate::config::AnalyticsConfig;

/// 地理位置信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// 国家名称（英文，如 "United States"）
    pub country: Option<String>,
    pub city: Option<String>,
}

impl GeoInfo {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.city.is_none()
    }
}

/// 查询失败（与"库中没有该地址"区分）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoLookupError {
    InvalidAddress(String),
    Request(String),
    Decode(String),
}

impl std::fmt::Display for GeoLookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress(ip) => write!(f, "not an IP address: {}", ip),
            Self::Request(msg) => write!(f, "GeoIP request failed: {}", msg),
            Self::Decode(msg) => write!(f, "GeoIP response decode failed: {}", msg),
        }
    }
}

impl std::error::Error for GeoLookupError {}

pub type GeoLookupResult = Result<Option<GeoInfo>, GeoLookupError>;

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    /// `Ok(None)`：库中没有该地址；`Err`：查询本身失败
    async fn lookup(&self, ip: &str) -> GeoLookupResult;

    /// provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP Provider
#[derive(Clone)]
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    /// 根据 AnalyticsConfig 初始化；关闭地理查询时返回 None
    pub fn from_config(config: &AnalyticsConfig) -> Option<Self> {
        if !config.enable_geo_lookup {
            info!("GeoIP: lookup disabled by configuration");
            return None;
        }

        let inner: Arc<dyn GeoIpLookup> = if let Some(ref path) = config.maxminddb_path {
            match MaxMindProvider::open(path) {
                Ok(provider) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, falling back to external API",
                        path, e
                    );
                    Arc::new(ExternalApiProvider::new(&config.geoip_api_url))
                }
            }
        } else {
            debug!("GeoIP: No MaxMind database configured, using external API");
            Arc::new(ExternalApiProvider::new(&config.geoip_api_url))
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Some(Self { inner })
    }

    /// 使用自定义实现（嵌入方与测试）
    pub fn with_lookup(inner: Arc<dyn GeoIpLookup>) -> Self {
        Self { inner }
    }

    pub async fn lookup(&self, ip: &str) -> GeoLookupResult {
        self.inner.lookup(ip).await
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}
