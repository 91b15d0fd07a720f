//! Admin API 服务模块
//!
//! 该模块包含管理后台的所有端点，包括：
//! - 首页统计与商品创建
//! - 邮件活动开关、间隔与单次发送
//! - 邮件列表导入与查询
//! - 追踪链接与点击日志

pub mod campaign;
pub mod dashboard;
pub mod links;
pub mod routes;

pub use routes::admin_v1_routes;
