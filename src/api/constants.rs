//! API 模块常量定义

/// Access Token Cookie 名称
pub const ACCESS_COOKIE_NAME: &str = "shoptrack_access";

/// Refresh Token Cookie 名称
pub const REFRESH_COOKIE_NAME: &str = "shoptrack_refresh";

/// 分页默认值
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 单个短链接默认返回的点击记录条数
pub const DEFAULT_CLICK_LIMIT: u64 = 100;
