//! 目标地址校验
//!
//! 追踪链接只允许跳转到带主机名的 http/https 地址

use url::Url;

/// 校验并规范化跳转目标
pub fn validate_target_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = Url::parse(raw).map_err(|e| format!("Invalid URL format: {}", e))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(format!(
                "Invalid protocol: {}:. Only http:// and https:// are allowed",
                other
            ));
        }
    }

    if parsed.host_str().is_none_or(|h| h.is_empty()) {
        return Err("URL must contain a host".to_string());
    }

    Ok(parsed)
}
