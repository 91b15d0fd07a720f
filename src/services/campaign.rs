//! Email campaign service
//!
//! The mailing list is a queue of rows moving Pending → Sent / Failed. A
//! Running/Paused flag and the send interval live in the settings table, so
//! the CLI, the admin API and the embedded scheduler all observe the same
//! state. `process_one` handles at most one row per call.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::mailer::Mailer;
use super::templates;
use super::tracking::TrackingService;
use crate::config::CampaignConfig;
use crate::errors::{Result, ShoptrackError};
use crate::storage::settings_store::keys;
use crate::storage::{
    CampaignState, ImportSummary, MailStatus, MailingEntry, SeaOrmStorage, SettingsStore,
    StatusCounts,
};
use crate::utils::{is_valid_email, normalize_email};

/// 活动总览
#[derive(Debug, Clone, Serialize)]
pub struct CampaignStatus {
    pub state: CampaignState,
    pub interval_minutes: u64,
    pub counts: StatusCounts,
}

/// 单次处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ProcessOutcome {
    /// 开关未处于 Running，什么都没做
    Paused,
    /// 没有 Pending 行，开关已切回 Paused
    Exhausted,
    Sent { email: String, code: String },
    Failed { email: String, error: String },
}

/// 发送间隔上限（7 天）
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// 拆分导入文本：换行、逗号、分号均为分隔符
pub fn split_email_input(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(['\n', '\r', ',', ';'])
        .map(normalize_email)
        .filter(|e| !e.is_empty())
}

pub struct CampaignService {
    storage: Arc<SeaOrmStorage>,
    settings: SettingsStore,
    tracking: Arc<TrackingService>,
    mailer: Arc<dyn Mailer>,
    config: CampaignConfig,
    lock: Mutex<()>,
}

impl CampaignService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        tracking: Arc<TrackingService>,
        mailer: Arc<dyn Mailer>,
        config: CampaignConfig,
    ) -> Self {
        let settings = SettingsStore::new(storage.get_db().clone());
        Self {
            storage,
            settings,
            tracking,
            mailer,
            config,
            lock: Mutex::new(()),
        }
    }

    // ============ Mailing list ============

    pub async fn import_emails(&self, text: &str) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for email in split_email_input(text) {
            if !is_valid_email(&email) {
                summary.invalid += 1;
                continue;
            }
            if !seen.insert(email.clone()) {
                summary.skipped += 1;
                continue;
            }
            candidates.push(email);
        }

        let existing = self.storage.existing_mailing_emails(&candidates).await?;
        let fresh: Vec<String> = candidates
            .into_iter()
            .filter(|e| !existing.contains(e))
            .collect();
        summary.skipped += existing.len();
        summary.added = self.storage.insert_mailing_entries(&fresh).await?;

        info!(
            "Mailing list import: {} added, {} skipped, {} invalid",
            summary.added, summary.skipped, summary.invalid
        );
        Ok(summary)
    }

    pub async fn list_entries(
        &self,
        status: Option<MailStatus>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<MailingEntry>, u64)> {
        self.storage
            .list_mailing_entries(status, page, page_size)
            .await
    }

    /// Failed → Pending
    pub async fn reset_failed(&self) -> Result<u64> {
        self.storage.reset_failed_entries().await
    }

    // ============ Settings ============

    /// 读取开关；缺失或无法解析时视为 Paused
    pub async fn state(&self) -> Result<CampaignState> {
        let raw = self.settings.get(keys::SCHEDULER_STATUS).await?;
        Ok(raw
            .and_then(|v| v.trim().parse::<CampaignState>().ok())
            .unwrap_or(CampaignState::Paused))
    }

    pub async fn set_state(&self, state: CampaignState) -> Result<()> {
        self.settings
            .set(keys::SCHEDULER_STATUS, state.as_ref())
            .await?;
        info!("Campaign state set to {}", state);
        Ok(())
    }

    pub async fn interval_minutes(&self) -> Result<u64> {
        let value = match self.settings.get(keys::SCHEDULER_INTERVAL).await? {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(v) if (1..=MAX_INTERVAL_MINUTES).contains(&v) => v,
                _ => {
                    warn!(
                        "Invalid {} value '{}', using default",
                        keys::SCHEDULER_INTERVAL,
                        raw
                    );
                    self.default_interval()
                }
            },
            None => self.default_interval(),
        };
        Ok(value)
    }

    fn default_interval(&self) -> u64 {
        self.config
            .default_interval_minutes
            .clamp(1, MAX_INTERVAL_MINUTES)
    }

    pub async fn set_interval(&self, minutes: u64) -> Result<()> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            return Err(ShoptrackError::validation(format!(
                "Interval must be between 1 and {} minutes",
                MAX_INTERVAL_MINUTES
            )));
        }
        self.settings
            .set(keys::SCHEDULER_INTERVAL, &minutes.to_string())
            .await?;
        info!("Campaign interval set to {} minutes", minutes);
        Ok(())
    }

    pub async fn status(&self) -> Result<CampaignStatus> {
        Ok(CampaignStatus {
            state: self.state().await?,
            interval_minutes: self.interval_minutes().await?,
            counts: self.storage.mailing_status_counts().await?,
        })
    }

    // ============ Sender ============

    /// 处理一行 Pending 记录
    pub async fn process_one(&self) -> Result<ProcessOutcome> {
        let _guard = self.lock.lock().await;

        if self.state().await? != CampaignState::Running {
            return Ok(ProcessOutcome::Paused);
        }

        let Some(entry) = self.storage.next_pending_entry().await? else {
            self.set_state(CampaignState::Paused).await?;
            info!("Campaign: no pending entries left, paused");
            return Ok(ProcessOutcome::Exhausted);
        };

        let link = self
            .tracking
            .generate_trackable_link(&self.config.target_url, Some(&entry.email))
            .await?;
        let trackable = format!("{}{}", self.config.link_base_url, link.short_code);
        let message = templates::campaign_email(&entry.email, &self.config, &trackable);

        let outcome = match self.mailer.send(&message).await {
            Ok(()) => {
                info!("Campaign mail sent to {} ({})", entry.email, link.short_code);
                ProcessOutcome::Sent {
                    email: entry.email.clone(),
                    code: link.short_code.clone(),
                }
            }
            Err(e) => {
                error!("Campaign mail to {} failed: {}", entry.email, e);
                ProcessOutcome::Failed {
                    email: entry.email.clone(),
                    error: e.message().to_string(),
                }
            }
        };

        let (status, sent_date) = match outcome {
            ProcessOutcome::Sent { .. } => (MailStatus::Sent, Some(Utc::now())),
            _ => (MailStatus::Failed, None),
        };
        if !self
            .storage
            .finalize_mailing_entry(entry.id, status, sent_date)
            .await?
        {
            warn!(
                "Mailing entry {} was finalized elsewhere, status left unchanged",
                entry.id
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_email_input() {
        let emails: Vec<String> =
            split_email_input(" A@Example.com\n\nb@example.com, c@example.com;\r\n").collect();
        assert_eq!(
            emails,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let json = serde_json::to_value(ProcessOutcome::Sent {
            email: "a@example.com".into(),
            code: "AbC1234".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "sent");
        assert_eq!(json["code"], "AbC1234");
    }
}
