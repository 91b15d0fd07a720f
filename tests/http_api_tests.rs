//! HTTP API integration tests
//!
//! Drives the full route table (auth, catalog, admin, health) through
//! `configure_app`, the same wiring the server uses.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use shoptrack::api::constants::ACCESS_COOKIE_NAME;
use shoptrack::api::services::AppStartTime;
use shoptrack::config::{DatabaseConfig, StaticConfig};
use shoptrack::errors::Result;
use shoptrack::runtime::lifetime::startup::RouteConfig;
use shoptrack::runtime::modes::server::configure_app;
use shoptrack::services::{AppServices, EmailMessage, Mailer};

// =============================================================================
// Test Setup
// =============================================================================

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "capturing"
    }
}

struct TestEnv {
    _dir: TempDir,
    services: AppServices,
    mailer: Arc<CapturingMailer>,
}

async fn setup() -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("http_api_test.db");

    let mut config = StaticConfig::default();
    config.database = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };
    config.auth.jwt_secret = "http-api-test-secret-with-enough-bytes".to_string();

    let storage = Arc::new(
        shoptrack::storage::SeaOrmStorage::new(&config.database)
            .await
            .expect("Failed to create storage"),
    );
    let mailer = Arc::new(CapturingMailer::default());
    let services = AppServices::assemble(storage, &config, mailer.clone(), None);

    TestEnv {
        _dir: dir,
        services,
        mailer,
    }
}

fn routes() -> RouteConfig {
    RouteConfig {
        admin_prefix: "/admin".to_string(),
        health_prefix: "/health".to_string(),
    }
}

fn peer() -> SocketAddr {
    "203.0.113.7:50000".parse().unwrap()
}

macro_rules! full_app {
    ($env:expr) => {{
        let services = $env.services.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .configure(move |cfg| configure_app(cfg, &services, &routes())),
        )
        .await
    }};
}

/// 登录并返回 access cookie
macro_rules! login_cookie {
    ($app:expr, $email:expr, $password:expr) => {{
        let req = TestRequest::post()
            .uri("/api/v1/auth/login")
            .peer_addr(peer())
            .set_json(json!({ "email": $email, "password": $password }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.response()
            .cookies()
            .find(|c| c.name() == ACCESS_COOKIE_NAME)
            .map(|c| Cookie::new(ACCESS_COOKIE_NAME, c.value().to_string()))
            .expect("access cookie not set")
    }};
}

// =============================================================================
// Auth
// =============================================================================

#[actix_rt::test]
async fn test_register_verify_login_me_flow() {
    let env = setup().await;
    let app = full_app!(env);

    let req = TestRequest::post()
        .uri("/api/v1/auth/register")
        .peer_addr(peer())
        .set_json(json!({
            "username": "ivy",
            "email": "ivy@example.com",
            "password": "ivypass1",
            "confirm_password": "ivypass1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["email"], "ivy@example.com");
    assert!(body["data"].get("password_hash").is_none());

    // 未验证登录被拒
    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "email": "ivy@example.com", "password": "ivypass1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let code = {
        let sent = env.mailer.sent.lock().unwrap();
        let text = &sent.last().unwrap().body_text;
        text.split("verification code is: ").nth(1).unwrap()[..6].to_string()
    };
    let req = TestRequest::post()
        .uri("/api/v1/auth/verify-otp")
        .peer_addr(peer())
        .set_json(json!({ "email": "ivy@example.com", "code": code }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = login_cookie!(app, "ivy@example.com", "ivypass1");

    let req = TestRequest::get()
        .uri("/api/v1/auth/me")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], "ivy");
    assert_eq!(body["data"]["is_verified"], true);
}

#[actix_rt::test]
async fn test_me_requires_session() {
    let env = setup().await;
    let app = full_app!(env);

    let req = TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_bad_credentials_return_401() {
    let env = setup().await;
    let app = full_app!(env);

    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "email": "nobody@example.com", "password": "whatever" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Login unsuccessful. Please check email and password."
    );
}

#[actix_rt::test]
async fn test_mail_triggering_endpoints_are_rate_limited() {
    let env = setup().await;
    let app = full_app!(env);

    for (uri, payload) in [
        ("/api/v1/auth/resend-otp", json!({ "email": "spam@example.com" })),
        (
            "/api/v1/auth/reset-password/request",
            json!({ "email": "spam@example.com" }),
        ),
        (
            "/api/v1/auth/verify-otp",
            json!({ "email": "spam@example.com", "code": "000000" }),
        ),
    ] {
        let mut statuses = Vec::new();
        for _ in 0..6 {
            let req = TestRequest::post()
                .uri(uri)
                .peer_addr(peer())
                .set_json(payload.clone())
                .to_request();
            statuses.push(test::call_service(&app, req).await.status());
        }
        assert!(
            statuses[..5]
                .iter()
                .all(|s| *s != StatusCode::TOO_MANY_REQUESTS),
            "{} limited too early: {:?}",
            uri,
            statuses
        );
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS, "{}", uri);
    }
    assert!(env.mailer.sent.lock().unwrap().is_empty());
}

// =============================================================================
// Admin guard
// =============================================================================

#[actix_rt::test]
async fn test_admin_routes_require_admin_session() {
    let env = setup().await;
    env.services
        .identity
        .create_admin("root", "root@example.com", "rootpass")
        .await
        .unwrap();
    env.services
        .identity
        .create_admin("temp", "plain@example.com", "plainpass")
        .await
        .unwrap();
    // 降级成普通用户
    env.services
        .storage
        .set_admin_by_email("plain@example.com", false)
        .await
        .unwrap();
    let app = full_app!(env);

    let req = TestRequest::get().uri("/admin/v1/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let plain = login_cookie!(app, "plain@example.com", "plainpass");
    let req = TestRequest::get()
        .uri("/admin/v1/dashboard")
        .cookie(plain)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = login_cookie!(app, "root@example.com", "rootpass");
    let req = TestRequest::get()
        .uri("/admin/v1/dashboard")
        .cookie(admin)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert!(body["data"].is_object());
}

#[actix_rt::test]
async fn test_admin_campaign_and_links_endpoints() {
    let env = setup().await;
    env.services
        .identity
        .create_admin("root", "root@example.com", "rootpass")
        .await
        .unwrap();
    let app = full_app!(env);
    let admin = login_cookie!(app, "root@example.com", "rootpass");

    let req = TestRequest::post()
        .uri("/admin/v1/mailing-list/import")
        .cookie(admin.clone())
        .set_json(json!({ "emails": "a@example.com\nb@example.com\nbroken" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["added"], 2);
    assert_eq!(body["data"]["invalid"], 1);

    let req = TestRequest::put()
        .uri("/admin/v1/campaign/interval")
        .cookie(admin.clone())
        .set_json(json!({ "minutes": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::put()
        .uri("/admin/v1/campaign/interval")
        .cookie(admin.clone())
        .set_json(json!({ "minutes": u64::MAX }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/admin/v1/campaign/start")
        .cookie(admin.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["state"], "Running");

    let req = TestRequest::post()
        .uri("/admin/v1/campaign/send-now")
        .cookie(admin.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["outcome"], "sent");
    assert_eq!(body["data"]["email"], "a@example.com");

    let req = TestRequest::get()
        .uri("/admin/v1/mailing-list?status=Pending")
        .cookie(admin.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["email"], "b@example.com");

    let req = TestRequest::post()
        .uri("/admin/v1/links")
        .cookie(admin.clone())
        .set_json(json!({ "long_url": "https://shop.test/manual" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let code = body["data"]["short_code"].as_str().unwrap().to_string();

    let req = TestRequest::get()
        .uri("/admin/v1/links")
        .cookie(admin.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let req = TestRequest::delete()
        .uri(&format!("/admin/v1/links/{}", code))
        .cookie(admin.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get()
        .uri(&format!("/{}", code))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::get()
        .uri(&format!("/admin/v1/links/{}/clicks", code))
        .cookie(admin)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Catalog
// =============================================================================

#[actix_rt::test]
async fn test_catalog_listing_and_admin_create() {
    let env = setup().await;
    env.services
        .identity
        .create_admin("root", "root@example.com", "rootpass")
        .await
        .unwrap();
    let app = full_app!(env);
    let admin = login_cookie!(app, "root@example.com", "rootpass");

    let req = TestRequest::post()
        .uri("/admin/v1/products")
        .cookie(admin.clone())
        .set_json(json!({ "name": "  Mug ", "price_cents": 1299, "stock": 3 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["name"], "Mug");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::post()
        .uri("/admin/v1/products")
        .cookie(admin)
        .set_json(json!({ "name": "Bad", "price_cents": -1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = TestRequest::get()
        .uri(&format!("/api/v1/products/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/api/v1/products/9999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Health
// =============================================================================

#[actix_rt::test]
async fn test_health_endpoints() {
    let env = setup().await;
    let app = full_app!(env);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
