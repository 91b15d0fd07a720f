//! Admin API 路由配置
//!
//! 将 /v1 下的路由按功能模块拆分，整个 scope 由 `SessionAuth::admin()` 保护。

use actix_web::web;

use super::campaign::{
    get_campaign, get_mailing_list, import_mailing_list, pause_campaign, reset_failed,
    send_now, start_campaign, update_interval,
};
use super::dashboard::{create_product, get_dashboard};
use super::links::{create_link, delete_link, get_link_clicks, get_links};

/// 邮件活动路由 `/campaign`
///
/// - GET /campaign - 开关、间隔与各状态计数
/// - POST /campaign/start | /campaign/pause
/// - PUT /campaign/interval - 修改发送间隔（分钟）
/// - POST /campaign/send-now - 立即处理一行
/// - POST /campaign/reset-failed - Failed 重新排队
pub fn campaign_routes() -> actix_web::Scope {
    web::scope("/campaign")
        .route("", web::get().to(get_campaign))
        .route("/start", web::post().to(start_campaign))
        .route("/pause", web::post().to(pause_campaign))
        .route("/interval", web::put().to(update_interval))
        .route("/send-now", web::post().to(send_now))
        .route("/reset-failed", web::post().to(reset_failed))
}

/// 邮件列表路由 `/mailing-list`
pub fn mailing_list_routes() -> actix_web::Scope {
    web::scope("/mailing-list")
        .route("", web::get().to(get_mailing_list))
        .route("/import", web::post().to(import_mailing_list))
}

/// 追踪链接路由 `/links`
///
/// - GET /links - 分页列出
/// - POST /links - 创建追踪链接
/// - GET /links/{code}/clicks - 点击日志
/// - DELETE /links/{code} - 软删除
pub fn links_routes() -> actix_web::Scope {
    web::scope("/links")
        .route("", web::get().to(get_links))
        .route("", web::post().to(create_link))
        .route("/{code}/clicks", web::get().to(get_link_clicks))
        .route("/{code}", web::delete().to(delete_link))
}

/// Admin API v1 路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .route("/dashboard", web::get().to(get_dashboard))
        .route("/products", web::post().to(create_product))
        .service(campaign_routes())
        .service(mailing_list_routes())
        .service(links_routes())
}
