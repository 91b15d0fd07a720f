use std::collections::HashSet;

use shoptrack::utils::ip::{is_geo_lookup_candidate, resolve_client_ip};
use shoptrack::utils::{
    generate_numeric_code, generate_random_code, is_valid_email, is_valid_short_code,
    normalize_email,
};

#[test]
fn test_generate_random_code_characters() {
    let code = generate_random_code(100);
    let valid_chars: HashSet<char> =
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
            .chars()
            .collect();

    for ch in code.chars() {
        assert!(valid_chars.contains(&ch), "Invalid character: {}", ch);
    }
    assert!(is_valid_short_code(&generate_random_code(7)));
}

#[test]
fn test_generate_random_code_uniqueness() {
    let mut codes = HashSet::new();
    for _ in 0..1000 {
        codes.insert(generate_random_code(8));
    }
    assert!(
        codes.len() > 990,
        "Generated codes lack sufficient randomness"
    );
}

#[test]
fn test_numeric_code_keeps_leading_zeros() {
    for _ in 0..200 {
        let code = generate_numeric_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn test_email_normalization_and_validation() {
    assert_eq!(normalize_email("  Mixed.Case@Example.COM "), "mixed.case@example.com");
    assert!(is_valid_email("a.b+tag@shop.example.com"));
    assert!(!is_valid_email("no-at-sign.example.com"));
    assert!(!is_valid_email("two@@example.com"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("user@localhost"));
    assert!(!is_valid_email("sp ace@example.com"));
}

#[test]
fn test_client_ip_resolution() {
    let none: Vec<String> = Vec::new();

    // 公网直连：忽略伪造的转发头
    assert_eq!(
        resolve_client_ip(Some("203.0.113.9:5000"), Some("1.2.3.4".into()), &none).as_deref(),
        Some("203.0.113.9")
    );

    // 私有地址视为反向代理
    assert_eq!(
        resolve_client_ip(Some("10.0.0.2:5000"), Some("1.2.3.4".into()), &none).as_deref(),
        Some("1.2.3.4")
    );

    // 显式配置时只信任列表中的代理
    let trusted = vec!["192.0.2.1".to_string()];
    assert_eq!(
        resolve_client_ip(Some("10.0.0.2:5000"), Some("1.2.3.4".into()), &trusted).as_deref(),
        Some("10.0.0.2")
    );
    assert_eq!(
        resolve_client_ip(Some("192.0.2.1:5000"), Some("1.2.3.4".into()), &trusted).as_deref(),
        Some("1.2.3.4")
    );
}

#[test]
fn test_geo_lookup_candidates() {
    assert!(is_geo_lookup_candidate("8.8.8.8"));
    assert!(!is_geo_lookup_candidate("127.0.0.1"));
    assert!(!is_geo_lookup_candidate("192.168.0.10"));
    assert!(!is_geo_lookup_candidate("::1"));
    assert!(!is_geo_lookup_candidate("not-an-ip"));
}
