pub mod ip;
pub mod password;
pub mod url_validator;

/// 短码字符集
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| CODE_CHARSET[rand::random_range(0..CODE_CHARSET.len())] as char)
        .take(length)
        .collect()
}

/// 生成指定位数的数字验证码（允许前导 0）
pub fn generate_numeric_code(digits: usize) -> String {
    std::iter::repeat_with(|| char::from(b'0' + rand::random_range(0..10u8)))
        .take(digits)
        .collect()
}

/// 生成 URL 安全的随机 token（十六进制）
pub fn generate_secure_token(bytes: usize) -> String {
    (0..bytes)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect()
}

/// 短码只允许 ASCII 字母和数字
#[inline]
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= 16 && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// 规范化邮箱：去空白、转小写
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 邮箱格式检查：恰好一个 `@`，本地部分非空，域名包含点且两端非空
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !domain.starts_with('.')
}
