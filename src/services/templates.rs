//! 邮件正文模板（纯文本 + HTML）

use super::mailer::EmailMessage;
use crate::config::CampaignConfig;

/// 转义 HTML 特殊字符
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn wrap_html(title: &str, inner: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
{inner}
</body>
</html>"#,
        title = escape_html(title),
        inner = inner
    )
}

pub fn otp_email(to: &str, username: &str, code: &str, ttl_minutes: u64) -> EmailMessage {
    let subject = "Your verification code".to_string();
    let body_text = format!(
        "Hi {username},\n\nYour verification code is: {code}\n\nIt expires in {ttl_minutes} minutes. If you did not sign up, you can ignore this email.\n"
    );
    let body_html = wrap_html(
        &subject,
        &format!(
            r#"<p>Hi {name},</p>
<p>Your verification code is:</p>
<p style="font-size: 28px; font-weight: bold; letter-spacing: 6px;">{code}</p>
<p style="color: #666; font-size: 14px;">It expires in {ttl_minutes} minutes. If you did not sign up, you can ignore this email.</p>"#,
            name = escape_html(username),
            code = escape_html(code),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        to_name: Some(username.to_string()),
        subject,
        body_text,
        body_html: Some(body_html),
    }
}

pub fn password_reset_email(
    to: &str,
    username: &str,
    reset_url: &str,
    ttl_minutes: u64,
) -> EmailMessage {
    let subject = "Password Reset Request".to_string();
    let body_text = format!(
        "To reset your password, visit the following link:\n{reset_url}\n\nThe link expires in {ttl_minutes} minutes.\nIf you did not make this request then simply ignore this email and no changes will be made.\n"
    );
    let body_html = wrap_html(
        &subject,
        &format!(
            r#"<p>Hi {name},</p>
<p>To reset your password, click the link below:</p>
<p><a href="{url}">{url}</a></p>
<p style="color: #666; font-size: 14px;">The link expires in {ttl_minutes} minutes. If you did not make this request then simply ignore this email and no changes will be made.</p>"#,
            name = escape_html(username),
            url = escape_html(reset_url),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        to_name: Some(username.to_string()),
        subject,
        body_text,
        body_html: Some(body_html),
    }
}

/// 活动推广邮件：公司名与每个商品都指向同一个追踪链接
pub fn campaign_email(to: &str, campaign: &CampaignConfig, trackable_link: &str) -> EmailMessage {
    let mut text = format!(
        "{}\n\n{} has picked these for you:\n\n",
        campaign.greeting, campaign.company_name
    );
    for product in &campaign.products {
        text.push_str(&format!("- {}: {}\n", product, trackable_link));
    }
    text.push_str(&format!(
        "\nVisit {} at {}\n\n{}\n",
        campaign.company_display, trackable_link, campaign.closing
    ));

    let link = escape_html(trackable_link);
    let items: String = campaign
        .products
        .iter()
        .map(|p| format!(r#"    <li><a href="{link}">{}</a></li>"#, escape_html(p)))
        .collect::<Vec<_>>()
        .join("\n");
    let html = wrap_html(
        &campaign.subject,
        &format!(
            r#"<p>{greeting}</p>
<h2><a href="{link}">{company}</a></h2>
<ul>
{items}
</ul>
<p><a href="{link}">{display}</a></p>
<p>{closing}</p>"#,
            greeting = escape_html(&campaign.greeting),
            company = escape_html(&campaign.company_name),
            display = escape_html(&campaign.company_display),
            closing = escape_html(&campaign.closing),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        to_name: None,
        subject: campaign.subject.clone(),
        body_text: text,
        body_html: Some(html),
    }
}
