//! IP 地址处理工具
//!
//! 提供统一的客户端 IP 提取功能，支持：
//! - 可信代理配置（server.trusted_proxies）
//! - CIDR 匹配
//! - 私有 IP 自动检测

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

use crate::config::get_config;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// 解析 "ip" 或 "ip:port" 形式的地址
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// 是否值得做地理位置查询（公网地址）
pub fn is_geo_lookup_candidate(ip: &str) -> bool {
    parse_ip(ip).is_some_and(|addr| !is_private_or_local(&addr))
}

/// 检查 IP 是否在可信代理列表中
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip_addr) = parse_ip(ip) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip_addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr)
        }
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };

    let Ok(prefix_len): Result<u8, _> = prefix_len.parse() else {
        return false;
    };

    let Ok(network_addr) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network_addr) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len as u32).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len as u32).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 根据连接地址和转发头决定客户端 IP
///
/// 1. 显式配置 trusted_proxies：仅当连接来自其中之一时才采用转发头
/// 2. 未配置：连接来自私有地址时视为反向代理，采用转发头
/// 3. 其余情况使用连接地址
pub fn resolve_client_ip(
    peer: Option<&str>,
    forwarded: Option<String>,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer) = peer else {
        return forwarded;
    };
    let peer_ip = parse_ip(peer).map(|ip| ip.to_string());

    let trust_forwarded = if trusted_proxies.is_empty() {
        parse_ip(peer).is_some_and(|ip| is_private_or_local(&ip))
    } else {
        is_trusted_proxy(peer, trusted_proxies)
    };

    if trust_forwarded && let Some(real_ip) = forwarded.as_deref().and_then(parse_ip) {
        debug!("Client IP via proxy {}: {}", peer, real_ip);
        return Some(real_ip.to_string());
    }

    peer_ip.or_else(|| Some(peer.to_string()))
}

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let config = get_config();
    let conn_info = req.connection_info();
    resolve_client_ip(
        conn_info.peer_addr(),
        extract_forwarded_ip_from_headers(req.headers()),
        &config.server.trusted_proxies,
    )
}

/// 从 HeaderMap 提取转发的 IP（X-Forwarded-For 第一个值，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_private_or_local() {
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_geo_lookup_candidate() {
        assert!(is_geo_lookup_candidate("8.8.8.8"));
        assert!(is_geo_lookup_candidate("8.8.8.8:443"));
        assert!(!is_geo_lookup_candidate("127.0.0.1"));
        assert!(!is_geo_lookup_candidate("localhost"));
    }

    #[test]
    fn test_ip_in_cidr() {
        let ip: IpAddr = "192.168.1.100".parse().unwrap();
        assert!(ip_in_cidr(&ip, "192.168.1.0/24"));
        assert!(!ip_in_cidr(&ip, "10.0.0.0/8"));
        assert!(!ip_in_cidr(&ip, "192.168.1.0/40"));

        let ip6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(ip_in_cidr(&ip6, "2001:db8::/32"));
        assert!(!ip_in_cidr(&ip6, "192.168.1.0/24"));
    }

    #[test]
    fn test_resolve_client_ip_auto_detect() {
        // 私有连接地址 → 信任转发头
        assert_eq!(
            resolve_client_ip(Some("127.0.0.1"), Some("8.8.4.4".to_string()), &[]),
            Some("8.8.4.4".to_string())
        );
        // 公网直连 → 忽略伪造的转发头
        assert_eq!(
            resolve_client_ip(Some("1.2.3.4"), Some("8.8.4.4".to_string()), &[]),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_resolve_client_ip_explicit_proxies() {
        let proxies = vec!["10.0.0.0/8".to_string()];
        assert_eq!(
            resolve_client_ip(Some("10.1.2.3"), Some("9.9.9.9".to_string()), &proxies),
            Some("9.9.9.9".to_string())
        );
        assert_eq!(
            resolve_client_ip(Some("192.168.0.2"), Some("9.9.9.9".to_string()), &proxies),
            Some("192.168.0.2".to_string())
        );
    }

    #[test]
    fn test_resolve_client_ip_ignores_garbage_forwarded() {
        assert_eq!(
            resolve_client_ip(Some("127.0.0.1"), Some("not-an-ip".to_string()), &[]),
            Some("127.0.0.1".to_string())
        );
    }
}
