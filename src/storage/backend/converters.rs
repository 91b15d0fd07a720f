//! Entity model → domain model 转换

use std::str::FromStr;

use crate::errors::{Result, ShoptrackError};
use crate::storage::models::{
    ClickRecord, MailStatus, MailingEntry, OtpRecord, Product, ShortUrl, User,
};

use migration::entities::{click_log, mailing_list, otp_code, product, short_url, user};

pub fn model_to_user(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        is_admin: model.is_admin,
        is_verified: model.is_verified,
        created_at: model.created_at,
    }
}

/// 状态列只接受三个已知字面量，其它值视为数据损坏
pub fn parse_mail_status(raw: &str) -> Result<MailStatus> {
    MailStatus::from_str(raw).map_err(|_| {
        ShoptrackError::database_operation(format!("Unknown mailing status literal: '{}'", raw))
    })
}

pub fn model_to_mailing_entry(model: mailing_list::Model) -> Result<MailingEntry> {
    Ok(MailingEntry {
        id: model.id,
        status: parse_mail_status(&model.status)?,
        email: model.email,
        sent_date: model.sent_date,
        created_at: model.created_at,
    })
}

pub fn model_to_short_url(model: short_url::Model) -> ShortUrl {
    ShortUrl {
        id: model.id,
        long_url: model.long_url,
        short_code: model.short_code,
        created_for_email: model.created_for_email,
        click_count: model.click_count,
        is_deleted: model.is_deleted,
        created_at: model.created_at,
    }
}

pub fn model_to_click(model: click_log::Model) -> ClickRecord {
    ClickRecord {
        id: model.id,
        url_id: model.url_id,
        clicked_at: model.clicked_at,
        ip_address: model.ip_address,
        country: model.country,
        city: model.city,
        browser: model.browser,
        platform: model.platform,
        device_type: model.device_type,
        referrer: model.referrer,
        utm_source: model.utm_source,
        utm_medium: model.utm_medium,
        utm_campaign: model.utm_campaign,
    }
}

pub fn model_to_otp(model: otp_code::Model) -> OtpRecord {
    OtpRecord {
        id: model.id,
        email: model.email,
        purpose: model.purpose,
        code_hash: model.code_hash,
        expires_at: model.expires_at,
        attempts: model.attempts,
        consumed: model.consumed,
    }
}

pub fn model_to_product(model: product::Model) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price_cents: model.price_cents,
        description: model.description,
        image_file: model.image_file,
        stock: model.stock,
    }
}
