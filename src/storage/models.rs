use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 用户账户（不含密码哈希以外的敏感信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// 邮件发送状态
///
/// 数据库中以字符串保存，只会写入这三个字面量
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum MailStatus {
    Pending,
    Sent,
    Failed,
}

/// mailing_list 表中的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailingEntry {
    pub id: i32,
    pub email: String,
    pub status: MailStatus,
    pub sent_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 各状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.sent + self.failed
    }
}

/// 导入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
    pub invalid: usize,
}

/// 追踪短链接
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortUrl {
    pub id: i32,
    pub long_url: String,
    pub short_code: String,
    pub created_for_email: Option<String>,
    pub click_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// 待写入的点击记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewClick {
    pub url_id: i32,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    pub device_type: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// 已保存的点击记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRecord {
    pub id: i64,
    pub url_id: i32,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    pub device_type: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// 一次性验证码
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: i32,
    pub email: String,
    pub purpose: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub consumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price_cents: i64,
    pub description: Option<String>,
    pub image_file: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

/// 管理后台首页统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub verified_users: u64,
    pub total_links: u64,
    pub total_clicks: u64,
    pub total_products: u64,
    pub mailing: StatusCounts,
}

/// 批量发送开关（settings.scheduler_status）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum CampaignState {
    Running,
    Paused,
}
