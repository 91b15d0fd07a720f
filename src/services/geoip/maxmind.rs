//! 本地 GeoLite2-City 数据库

use async_trait::async_trait;
use maxminddb::{MaxMindDbError, Reader, geoip2};
use tracing::trace;

use super::provider::{GeoInfo, GeoIpLookup, GeoLookupError, GeoLookupResult};
use crate::utils::ip::parse_ip;

pub struct MaxMindProvider {
    reader: Reader<Vec<u8>>,
}

impl MaxMindProvider {
    pub fn open(path: &str) -> Result<Self, MaxMindDbError> {
        Ok(Self {
            reader: Reader::open_readfile(path)?,
        })
    }

    /// 只取英文国家名和城市名；两者都缺时按"未收录"处理
    fn city_record(&self, ip: &str) -> GeoLookupResult {
        let addr = parse_ip(ip).ok_or_else(|| GeoLookupError::InvalidAddress(ip.to_string()))?;

        let record = self
            .reader
            .lookup(addr)
            .and_then(|found| found.decode::<geoip2::City>())
            .map_err(|e| GeoLookupError::Decode(e.to_string()))?;

        Ok(record
            .map(|city| GeoInfo {
                country: city.country.names.english.map(str::to_owned),
                city: city.city.names.english.map(str::to_owned),
            })
            .filter(|info| !info.is_empty()))
    }
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> GeoLookupResult {
        let info = self.city_record(ip);
        trace!("MaxMind {} -> {:?}", ip, info);
        info
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
