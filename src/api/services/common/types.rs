//! HTTP API 类型定义

use serde::{Deserialize, Serialize};

use crate::api::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage::{MailStatus, User};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============ Auth ============

#[derive(Deserialize, Clone, Debug)]
pub struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct VerifyOtpBody {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ResetConfirmBody {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct AuthSuccessResponse {
    pub user: User,
    pub expires_in: u64,
}

// ============ Admin ============

#[derive(Deserialize, Clone, Debug)]
pub struct ImportEmailsBody {
    /// 每行一个地址，逗号或分号也可分隔
    pub emails: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct IntervalBody {
    pub minutes: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CreateLinkBody {
    pub long_url: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageQuery {
    /// 返回 (page, page_size)，page 从 1 开始
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct MailingListQuery {
    pub status: Option<MailStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LinksQuery {
    #[serde(default)]
    pub include_deleted: bool,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ClicksQuery {
    pub limit: Option<u64>,
}

#[derive(Serialize, Clone, Debug)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size.max(1)),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct PaginatedData<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Clone, Debug)]
pub struct ResetFailedResponse {
    pub requeued: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_clamps() {
        let q = PageQuery {
            page: Some(0),
            page_size: Some(10_000),
        };
        assert_eq!(q.resolve(), (1, MAX_PAGE_SIZE));
        assert_eq!(PageQuery::default().resolve(), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 20, 41).total_pages, 3);
    }

    #[test]
    fn test_mailing_query_parses_status() {
        let q: MailingListQuery = serde_json::from_str(r#"{"status":"Failed"}"#).unwrap();
        assert_eq!(q.status, Some(MailStatus::Failed));
    }
}
