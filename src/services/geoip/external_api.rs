//! 外部 GeoIP API 实现（默认 ip-api.com）
//!
//! 内置 moka 缓存，同一 IP 的并发查询只发一次 HTTP；请求失败不进缓存

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoInfo, GeoIpLookup, GeoLookupError, GeoLookupResult};

const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
const HTTP_TIMEOUT_SECS: u64 = 2;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

pub struct ExternalApiProvider {
    /// `{ip}` 为占位符
    api_url_template: String,
    /// "未收录"（None）也会缓存
    cache: Cache<String, Option<GeoInfo>>,
}

impl ExternalApiProvider {
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    /// 解析响应体
    ///
    /// ip-api.com 成功：{"status":"success","country":"United States","city":"Ashburn"}
    /// 失败：{"status":"fail","message":"private range"}
    fn parse_response(json: &serde_json::Value) -> Option<GeoInfo> {
        if json["status"].as_str() == Some("fail") {
            return None;
        }

        let non_empty = |v: &serde_json::Value| {
            v.as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let country = non_empty(&json["country"])
            .or_else(|| non_empty(&json["country_name"]))
            .or_else(|| non_empty(&json["countryCode"]));
        let city = non_empty(&json["city"]);

        if country.is_none() && city.is_none() {
            return None;
        }
        Some(GeoInfo { country, city })
    }

    /// 同步 HTTP 请求（在 spawn_blocking 中调用）
    fn fetch_from_api_sync(url: String) -> GeoLookupResult {
        let resp = get_agent().get(&url).call().map_err(|e| {
            warn!("GeoIP API request to \"{}\" failed: {}", url, e);
            GeoLookupError::Request(e.to_string())
        })?;

        let json: serde_json::Value = resp.into_body().read_json().map_err(|e| {
            warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
            GeoLookupError::Decode(e.to_string())
        })?;

        let info = Self::parse_response(&json);
        trace!("External API lookup result: {:?}", info);
        Ok(info)
    }

    async fn fetch_from_api(&self, ip: &str) -> GeoLookupResult {
        let url = self.api_url_template.replace("{ip}", ip);

        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(url))
            .await
            .map_err(|e| GeoLookupError::Request(format!("lookup task aborted: {}", e)))?
    }
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    async fn lookup(&self, ip: &str) -> GeoLookupResult {
        self.cache
            .try_get_with(ip.to_string(), async {
                trace!("GeoIP cache miss for {}, fetching from API", ip);
                self.fetch_from_api(ip).await
            })
            .await
            .map_err(|e| (*e).clone())
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
