//! User-Agent classification with woothee
//!
//! Every click row stores a browser family, an OS family and one of four
//! device classes: `mobile`, `tablet`, `pc`, `other`.

use serde::Serialize;
use strum::{AsRefStr, Display};
use woothee::parser::Parser;

const UNKNOWN: &str = "UNKNOWN";
const OTHER_FAMILY: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Pc,
    Other,
}

/// 解析后的 UA 信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: String,
    pub platform: String,
    pub device_type: DeviceType,
    pub is_bot: bool,
}

impl Default for ParsedUserAgent {
    fn default() -> Self {
        Self {
            browser: OTHER_FAMILY.to_string(),
            platform: OTHER_FAMILY.to_string(),
            device_type: DeviceType::Other,
            is_bot: false,
        }
    }
}

fn family(value: &str) -> String {
    if value.is_empty() || value == UNKNOWN {
        OTHER_FAMILY.to_string()
    } else {
        value.to_string()
    }
}

fn looks_like_tablet(ua: &str, os: &str) -> bool {
    os == "iPad"
        || ua.contains("iPad")
        || ua.contains("Tablet")
        || (os == "Android" && !ua.contains("Mobile"))
}

/// 解析 UA 字符串；空字符串或无法识别时返回 Other/Other/other
pub fn classify_user_agent(ua: &str) -> ParsedUserAgent {
    let ua = ua.trim();
    if ua.is_empty() {
        return ParsedUserAgent::default();
    }

    let Some(result) = Parser::new().parse(ua) else {
        return ParsedUserAgent::default();
    };

    let device_type = match result.category {
        "smartphone" | "mobilephone" if looks_like_tablet(ua, result.os) => DeviceType::Tablet,
        "smartphone" | "mobilephone" => DeviceType::Mobile,
        "pc" => DeviceType::Pc,
        _ => DeviceType::Other,
    };

    ParsedUserAgent {
        browser: family(result.name),
        platform: family(result.os),
        device_type,
        is_bot: result.category == "crawler",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";
    const GOOGLEBOT: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[test]
    fn test_desktop_chrome() {
        let parsed = classify_user_agent(CHROME_WINDOWS);
        assert_eq!(parsed.browser, "Chrome");
        assert_eq!(parsed.device_type, DeviceType::Pc);
        assert!(parsed.platform.starts_with("Windows"));
    }

    #[test]
    fn test_iphone_is_mobile() {
        let parsed = classify_user_agent(SAFARI_IPHONE);
        assert_eq!(parsed.device_type, DeviceType::Mobile);
        assert_eq!(parsed.platform, "iPhone");
    }

    #[test]
    fn test_tablets() {
        assert_eq!(classify_user_agent(SAFARI_IPAD).device_type, DeviceType::Tablet);
        assert_eq!(
            classify_user_agent(ANDROID_TABLET).device_type,
            DeviceType::Tablet
        );
    }

    #[test]
    fn test_crawler_is_other() {
        let parsed = classify_user_agent(GOOGLEBOT);
        assert_eq!(parsed.device_type, DeviceType::Other);
        assert!(parsed.is_bot);
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(classify_user_agent(""), ParsedUserAgent::default());
        let parsed = classify_user_agent("curl-like-thing/0.0");
        assert_eq!(parsed.device_type, DeviceType::Other);
        assert_eq!(DeviceType::Other.as_ref(), "other");
    }
}
