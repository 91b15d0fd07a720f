//! Outgoing mail
//!
//! Providers:
//! - `console`: 只写日志（开发环境）
//! - `webhook`: 以 JSON POST 到 HTTP 邮件网关

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::config::{MailConfig, MailProvider};
use crate::errors::{Result, ShoptrackError};

/// 一封待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// 发送失败返回 MailDelivery 错误
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// 根据配置创建 Mailer
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.provider {
        MailProvider::Console => Arc::new(ConsoleMailer::new(&config.from_address)),
        MailProvider::Webhook => Arc::new(WebhookMailer::new(config)?),
    };
    info!("Mail: using {} provider", mailer.name());
    Ok(mailer)
}

pub struct ConsoleMailer {
    from: String,
}

impl ConsoleMailer {
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            "Console mail delivered"
        );
        debug!("Mail body:\n{}", message.body_text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    from_name: &'a str,
    to: &'a str,
    to_name: Option<&'a str>,
    subject: &'a str,
    text: &'a str,
    html: Option<&'a str>,
}

pub struct WebhookMailer {
    url: String,
    token: Option<String>,
    from_address: String,
    from_name: String,
    agent: Agent,
}

impl WebhookMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let url = config
            .webhook_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                ShoptrackError::validation("mail.webhook_url is required for the webhook provider")
            })?;
        url::Url::parse(&url).map_err(|e| {
            ShoptrackError::validation(format!("mail.webhook_url is not a valid URL: {}", e))
        })?;

        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs.max(1))))
            .build()
            .into();

        Ok(Self {
            url,
            token: config.webhook_token.clone().filter(|t| !t.is_empty()),
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            agent,
        })
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let body = serde_json::to_value(WebhookPayload {
            from: &self.from_address,
            from_name: &self.from_name,
            to: &message.to,
            to_name: message.to_name.as_deref(),
            subject: &message.subject,
            text: &message.body_text,
            html: message.body_html.as_deref(),
        })?;

        let agent = self.agent.clone();
        let url = self.url.clone();
        let auth = self.token.as_ref().map(|t| format!("Bearer {}", t));
        let to = message.to.clone();

        let result = tokio::task::spawn_blocking(move || {
            let mut request = agent.post(&url);
            if let Some(auth) = auth {
                request = request.header("Authorization", auth);
            }
            request.send_json(&body).map(|_| ())
        })
        .await
        .map_err(|e| ShoptrackError::mail_delivery(format!("mail task failed: {}", e)))?;

        match result {
            Ok(()) => {
                debug!("Webhook mail accepted for {}", to);
                Ok(())
            }
            Err(e) => {
                warn!("Webhook mail to {} failed: {}", to, e);
                Err(ShoptrackError::mail_delivery(e.to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
