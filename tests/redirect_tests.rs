//! Redirect endpoint tests
//!
//! `GET /{code}` resolves a tracked link, writes one enriched click row and
//! answers with a 307 (or the interstitial page).

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use tempfile::TempDir;

use shoptrack::api::services::redirect_routes;
use shoptrack::config::{DatabaseConfig, RedirectMode, StaticConfig};
use shoptrack::errors::ShoptrackError;
use shoptrack::services::mailer::ConsoleMailer;
use shoptrack::services::{
    AppServices, GeoInfo, GeoIpLookup, GeoIpProvider, GeoLookupError, GeoLookupResult,
};

const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

// =============================================================================
// Test Setup
// =============================================================================

/// 8.8.8.8 有完整结果，1.1.1.1 只有国家，4.4.4.4 查询超时，其余查不到
struct FakeGeo;

#[async_trait]
impl GeoIpLookup for FakeGeo {
    async fn lookup(&self, ip: &str) -> GeoLookupResult {
        match ip {
            "8.8.8.8" => Ok(Some(GeoInfo {
                country: Some("United States".to_string()),
                city: Some("Mountain View".to_string()),
            })),
            "1.1.1.1" => Ok(Some(GeoInfo {
                country: Some("Australia".to_string()),
                city: None,
            })),
            "4.4.4.4" => Err(GeoLookupError::Request("timed out".to_string())),
            _ => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct TestEnv {
    _dir: TempDir,
    services: AppServices,
}

async fn setup(mode: RedirectMode, enable_ip_logging: bool) -> TestEnv {
    setup_with(mode, enable_ip_logging, |_| {}).await
}

async fn setup_with(
    mode: RedirectMode,
    enable_ip_logging: bool,
    tweak: impl FnOnce(&mut StaticConfig),
) -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("redirect_test.db");

    let mut config = StaticConfig::default();
    config.database = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };
    config.tracking.redirect_mode = mode;
    config.analytics.enable_ip_logging = enable_ip_logging;
    tweak(&mut config);

    let storage = Arc::new(
        shoptrack::storage::SeaOrmStorage::new(&config.database)
            .await
            .expect("Failed to create storage"),
    );
    let services = AppServices::assemble(
        storage,
        &config,
        Arc::new(ConsoleMailer::new("noreply@shop.test")),
        Some(GeoIpProvider::with_lookup(Arc::new(FakeGeo))),
    );

    TestEnv {
        _dir: dir,
        services,
    }
}

fn peer(ip: &str) -> SocketAddr {
    format!("{}:40000", ip).parse().unwrap()
}

macro_rules! redirect_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.services.tracking.clone()))
                .service(redirect_routes()),
        )
        .await
    };
}

// =============================================================================
// Tests
// =============================================================================

#[actix_rt::test]
async fn test_redirect_records_enriched_click() {
    let env = setup(RedirectMode::Redirect, true).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/sale", Some("r@example.com"))
        .await
        .unwrap();
    let app = redirect_app!(env);

    let req = TestRequest::get()
        .uri(&format!(
            "/{}?utm_source=newsletter&utm_medium=email&utm_campaign=spring%20sale",
            link.short_code
        ))
        .peer_addr(peer("8.8.8.8"))
        .insert_header(("User-Agent", SAFARI_IPHONE))
        .insert_header(("Referer", "https://mail.example.com/inbox"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://shop.test/sale"
    );

    let clicks = env
        .services
        .tracking
        .link_clicks(&link.short_code, 10)
        .await
        .unwrap();
    assert_eq!(clicks.len(), 1);
    let click = &clicks[0];
    assert_eq!(click.ip_address.as_deref(), Some("8.8.8.8"));
    assert_eq!(click.country.as_deref(), Some("United States"));
    assert_eq!(click.city.as_deref(), Some("Mountain View"));
    assert_eq!(click.device_type.as_deref(), Some("mobile"));
    assert_eq!(click.platform.as_deref(), Some("iPhone"));
    assert_eq!(click.referrer.as_deref(), Some("https://mail.example.com/inbox"));
    assert_eq!(click.utm_source.as_deref(), Some("newsletter"));
    assert_eq!(click.utm_medium.as_deref(), Some("email"));
    assert_eq!(click.utm_campaign.as_deref(), Some("spring sale"));

    let stored = env
        .services
        .storage
        .find_short_url(&link.short_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.click_count, 1);
}

#[actix_rt::test]
async fn test_geo_lookup_failure_leaves_location_empty() {
    let env = setup(RedirectMode::Redirect, true).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/", None)
        .await
        .unwrap();
    let app = redirect_app!(env);

    let req = TestRequest::get()
        .uri(&format!("/{}", link.short_code))
        .peer_addr(peer("4.4.4.4"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let clicks = env
        .services
        .tracking
        .link_clicks(&link.short_code, 10)
        .await
        .unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].ip_address.as_deref(), Some("4.4.4.4"));
    assert_eq!(clicks[0].country, None);
    assert_eq!(clicks[0].city, None);
}

#[actix_rt::test]
async fn test_geo_fallbacks() {
    let env = setup(RedirectMode::Redirect, true).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/", None)
        .await
        .unwrap();
    let app = redirect_app!(env);

    for ip in ["1.1.1.1", "9.9.9.9", "192.168.1.20"] {
        let req = TestRequest::get()
            .uri(&format!("/{}", link.short_code))
            .peer_addr(peer(ip))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    let clicks = env
        .services
        .tracking
        .link_clicks(&link.short_code, 10)
        .await
        .unwrap();
    assert_eq!(clicks.len(), 3);
    let by_ip = |ip: &str| {
        clicks
            .iter()
            .find(|c| c.ip_address.as_deref() == Some(ip))
            .unwrap()
    };

    // 部分结果：缺失字段填 Unknown
    let partial = by_ip("1.1.1.1");
    assert_eq!(partial.country.as_deref(), Some("Australia"));
    assert_eq!(partial.city.as_deref(), Some("Unknown"));

    // 查不到
    let missing = by_ip("9.9.9.9");
    assert_eq!(missing.country.as_deref(), Some("Unknown"));
    assert_eq!(missing.city.as_deref(), Some("Unknown"));

    // 私有地址不查询
    let private = by_ip("192.168.1.20");
    assert!(private.country.is_none());
    assert!(private.city.is_none());

    // 没有 UA 时按 other 记录
    assert_eq!(private.device_type.as_deref(), Some("other"));
}

#[actix_rt::test]
async fn test_ip_logging_disabled_keeps_geo() {
    let env = setup(RedirectMode::Redirect, false).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/", None)
        .await
        .unwrap();
    let app = redirect_app!(env);

    let req = TestRequest::get()
        .uri(&format!("/{}", link.short_code))
        .peer_addr(peer("8.8.8.8"))
        .to_request();
    test::call_service(&app, req).await;

    let clicks = env
        .services
        .tracking
        .link_clicks(&link.short_code, 10)
        .await
        .unwrap();
    assert!(clicks[0].ip_address.is_none());
    assert_eq!(clicks[0].country.as_deref(), Some("United States"));
}

#[actix_rt::test]
async fn test_unknown_invalid_and_deleted_codes_return_404() {
    let env = setup(RedirectMode::Redirect, true).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/", None)
        .await
        .unwrap();
    env.services
        .tracking
        .soft_delete(&link.short_code)
        .await
        .unwrap();
    let app = redirect_app!(env);

    for uri in [
        "/Zz9Zz9Z".to_string(),
        "/bad!code".to_string(),
        format!("/{}", link.short_code),
    ] {
        let req = TestRequest::get()
            .uri(&uri)
            .peer_addr(peer("8.8.8.8"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {}", uri);
    }

    // 软删除的链接不再记录点击，但历史仍可查询
    let clicks = env
        .services
        .tracking
        .link_clicks(&link.short_code, 10)
        .await
        .unwrap();
    assert!(clicks.is_empty());
}

#[actix_rt::test]
async fn test_interstitial_mode_serves_html() {
    let env = setup(RedirectMode::Interstitial, true).await;
    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/?a=1&b=2", None)
        .await
        .unwrap();
    let app = redirect_app!(env);

    let req = TestRequest::get()
        .uri(&format!("/{}", link.short_code))
        .peer_addr(peer("8.8.8.8"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Redirecting..."));
    assert!(html.contains("https://shop.test/?a=1&amp;b=2"));
}

#[tokio::test]
async fn test_generate_rejects_invalid_target() {
    let env = setup(RedirectMode::Redirect, true).await;
    assert!(
        env.services
            .tracking
            .generate_trackable_link("javascript:alert(1)", None)
            .await
            .is_err()
    );
    assert!(
        env.services
            .tracking
            .generate_trackable_link("not a url", None)
            .await
            .is_err()
    );
}

// =============================================================================
// Short code generation
// =============================================================================

const CODE_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[actix_rt::test]
async fn test_code_generation_gives_up_when_space_is_full() {
    let env = setup_with(RedirectMode::Redirect, true, |config| {
        config.tracking.code_length = 1;
        config.tracking.max_generation_attempts = 8;
    })
    .await;

    for c in CODE_CHARSET.chars() {
        env.services
            .storage
            .insert_short_url("https://shop.test/", &c.to_string(), None)
            .await
            .unwrap()
            .expect("single-char code should be free");
    }

    let err = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/new", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShoptrackError::CodeGeneration(_)));
}

#[actix_rt::test]
async fn test_code_generation_retries_past_collisions() {
    let env = setup_with(RedirectMode::Redirect, true, |config| {
        config.tracking.code_length = 1;
        config.tracking.max_generation_attempts = 5_000;
    })
    .await;

    // 只留下 "z" 可用
    for c in CODE_CHARSET.chars().filter(|c| *c != 'z') {
        env.services
            .storage
            .insert_short_url("https://shop.test/", &c.to_string(), None)
            .await
            .unwrap();
    }

    let link = env
        .services
        .tracking
        .generate_trackable_link("https://shop.test/new", None)
        .await
        .unwrap();
    assert_eq!(link.short_code, "z");

    // 同一短码再次插入撞上唯一索引
    let dup = env
        .services
        .storage
        .insert_short_url("https://shop.test/", "z", None)
        .await
        .unwrap();
    assert!(dup.is_none());
}
