//! Embedded campaign sender loop
//!
//! Calls `process_one` once per tick and sleeps `scheduler_interval`
//! minutes, re-read from the settings table before every sleep so the admin
//! API can change the pace without a restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::campaign::{CampaignService, ProcessOutcome};

/// 设置读取失败时的退避间隔
const FALLBACK_INTERVAL_SECS: u64 = 60;

pub fn spawn_campaign_scheduler(
    campaign: Arc<CampaignService>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Campaign scheduler started");

        loop {
            match campaign.process_one().await {
                Ok(ProcessOutcome::Paused) => debug!("Campaign scheduler: paused"),
                Ok(ProcessOutcome::Exhausted) => info!("Campaign scheduler: mailing list exhausted"),
                Ok(ProcessOutcome::Sent { email, code }) => {
                    debug!("Campaign scheduler: sent to {} ({})", email, code)
                }
                Ok(ProcessOutcome::Failed { email, error }) => {
                    warn!("Campaign scheduler: delivery to {} failed: {}", email, error)
                }
                Err(e) => error!("Campaign scheduler: process_one failed: {}", e),
            }

            let sleep_for = match campaign.interval_minutes().await {
                Ok(minutes) => Duration::from_secs(minutes.saturating_mul(60)),
                Err(e) => {
                    warn!("Campaign scheduler: cannot read interval: {}", e);
                    Duration::from_secs(FALLBACK_INTERVAL_SECS)
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Campaign scheduler stopped");
    })
}
