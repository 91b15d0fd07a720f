//! Campaign integration tests
//!
//! Mailing-list import, the Running/Paused switch stored in the settings
//! table, and the one-row-per-tick sender.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use tempfile::TempDir;
use tokio::sync::watch;

use shoptrack::config::{DatabaseConfig, StaticConfig};
use shoptrack::errors::{Result, ShoptrackError};
use shoptrack::services::campaign::MAX_INTERVAL_MINUTES;
use shoptrack::services::{
    AppServices, EmailMessage, Mailer, ProcessOutcome, spawn_campaign_scheduler,
};
use shoptrack::storage::settings_store::keys;
use shoptrack::storage::{CampaignState, MailStatus, SettingsStore};

// =============================================================================
// Test Setup
// =============================================================================

/// 可切换失败的 Mailer
#[derive(Default)]
struct SwitchableMailer {
    fail: AtomicBool,
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for SwitchableMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShoptrackError::mail_delivery("gateway returned 503"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "switchable"
    }
}

struct TestEnv {
    _dir: TempDir,
    services: AppServices,
    mailer: Arc<SwitchableMailer>,
}

async fn setup() -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("campaign_test.db");

    let mut config = StaticConfig::default();
    config.database = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };
    config.campaign.target_url = "https://shop.test/landing".to_string();
    config.campaign.link_base_url = "https://t.shop.test/".to_string();
    config.campaign.default_interval_minutes = 7;

    let storage = Arc::new(
        shoptrack::storage::SeaOrmStorage::new(&config.database)
            .await
            .expect("Failed to create storage"),
    );
    let mailer = Arc::new(SwitchableMailer::default());
    let services = AppServices::assemble(storage, &config, mailer.clone(), None);

    TestEnv {
        _dir: dir,
        services,
        mailer,
    }
}

// =============================================================================
// Import
// =============================================================================

#[tokio::test]
async fn test_import_counts_invalid_and_duplicates() {
    let env = setup().await;
    let campaign = &env.services.campaign;

    let summary = campaign
        .import_emails("a@example.com\nB@example.com, a@example.com; nope\n\n")
        .await
        .unwrap();
    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.invalid, 1);

    // 已在库中的地址只计入 skipped
    let again = campaign
        .import_emails("b@example.com\nc@example.com")
        .await
        .unwrap();
    assert_eq!(again.added, 1);
    assert_eq!(again.skipped, 1);

    let status = campaign.status().await.unwrap();
    assert_eq!(status.counts.pending, 3);
    assert_eq!(status.counts.total(), 3);
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_state_defaults_to_paused_and_tolerates_garbage() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    assert_eq!(campaign.state().await.unwrap(), CampaignState::Paused);

    let settings = SettingsStore::new(env.services.storage.get_db().clone());
    settings.set(keys::SCHEDULER_STATUS, "sideways").await.unwrap();
    assert_eq!(campaign.state().await.unwrap(), CampaignState::Paused);

    settings.set(keys::SCHEDULER_STATUS, "running").await.unwrap();
    assert_eq!(campaign.state().await.unwrap(), CampaignState::Running);
}

#[tokio::test]
async fn test_interval_validation_and_fallback() {
    let env = setup().await;
    let campaign = &env.services.campaign;

    assert_eq!(campaign.interval_minutes().await.unwrap(), 7);
    assert!(campaign.set_interval(0).await.is_err());

    campaign.set_interval(15).await.unwrap();
    assert_eq!(campaign.interval_minutes().await.unwrap(), 15);

    let settings = SettingsStore::new(env.services.storage.get_db().clone());
    settings
        .set(keys::SCHEDULER_INTERVAL, "soon")
        .await
        .unwrap();
    assert_eq!(campaign.interval_minutes().await.unwrap(), 7);
}

#[tokio::test]
async fn test_interval_upper_bound() {
    let env = setup().await;
    let campaign = &env.services.campaign;

    campaign.set_interval(MAX_INTERVAL_MINUTES).await.unwrap();
    assert_eq!(
        campaign.interval_minutes().await.unwrap(),
        MAX_INTERVAL_MINUTES
    );

    let err = campaign.set_interval(u64::MAX).await.unwrap_err();
    assert!(matches!(err, ShoptrackError::Validation(_)));
    assert!(campaign.set_interval(MAX_INTERVAL_MINUTES + 1).await.is_err());
    assert_eq!(
        campaign.interval_minutes().await.unwrap(),
        MAX_INTERVAL_MINUTES
    );

    // 绕过 API 直接写入的超大值回退到默认
    let settings = SettingsStore::new(env.services.storage.get_db().clone());
    settings
        .set(keys::SCHEDULER_INTERVAL, &u64::MAX.to_string())
        .await
        .unwrap();
    assert_eq!(campaign.interval_minutes().await.unwrap(), 7);
}

#[tokio::test]
async fn test_scheduler_survives_huge_stored_interval() {
    let env = setup().await;
    let settings = SettingsStore::new(env.services.storage.get_db().clone());
    settings
        .set(keys::SCHEDULER_INTERVAL, &u64::MAX.to_string())
        .await
        .unwrap();

    let (tx, rx) = watch::channel(false);
    let handle = spawn_campaign_scheduler(env.services.campaign.clone(), rx);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(!handle.is_finished(), "scheduler exited early");

    tx.send(true).unwrap();
    let joined = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop");
    assert!(joined.is_ok(), "scheduler task panicked");
}

#[tokio::test]
async fn test_unknown_status_literal_is_a_database_error() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    campaign.import_emails("odd@example.com").await.unwrap();

    env.services
        .storage
        .get_db()
        .execute_unprepared("UPDATE mailing_list SET status = 'Bounced'")
        .await
        .unwrap();

    let err = campaign.status().await.unwrap_err();
    assert!(matches!(err, ShoptrackError::DatabaseOperation(_)));
    assert!(err.message().contains("Bounced"));
}

// =============================================================================
// Sender
// =============================================================================

#[tokio::test]
async fn test_process_one_respects_pause() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    campaign.import_emails("a@example.com").await.unwrap();

    let outcome = campaign.process_one().await.unwrap();
    assert!(matches!(outcome, ProcessOutcome::Paused));
    assert!(env.mailer.sent.lock().unwrap().is_empty());
    assert_eq!(campaign.status().await.unwrap().counts.pending, 1);
}

#[tokio::test]
async fn test_process_one_sends_in_insertion_order_with_tracking_link() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    campaign
        .import_emails("first@example.com\nsecond@example.com")
        .await
        .unwrap();
    campaign.set_state(CampaignState::Running).await.unwrap();

    let outcome = campaign.process_one().await.unwrap();
    let ProcessOutcome::Sent { email, code } = outcome else {
        panic!("expected Sent, got {:?}", outcome);
    };
    assert_eq!(email, "first@example.com");

    let sent = env.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "first@example.com");
    assert!(
        sent[0]
            .body_text
            .contains(&format!("https://t.shop.test/{}", code))
    );

    // 短链接记录了收件人并指向活动落地页
    let link = env
        .services
        .storage
        .find_short_url(&code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.long_url, "https://shop.test/landing");
    assert_eq!(link.created_for_email.as_deref(), Some("first@example.com"));

    let (rows, _) = campaign
        .list_entries(Some(MailStatus::Sent), 1, 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].sent_date.is_some());
}

#[tokio::test]
async fn test_process_one_marks_failure_and_reset_requeues() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    campaign.import_emails("flaky@example.com").await.unwrap();
    campaign.set_state(CampaignState::Running).await.unwrap();

    env.mailer.fail.store(true, Ordering::SeqCst);
    let outcome = campaign.process_one().await.unwrap();
    match outcome {
        ProcessOutcome::Failed { email, error } => {
            assert_eq!(email, "flaky@example.com");
            assert!(error.contains("503"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }

    let status = campaign.status().await.unwrap();
    assert_eq!(status.counts.failed, 1);
    assert_eq!(status.counts.pending, 0);
    // 失败不会暂停活动
    assert_eq!(status.state, CampaignState::Running);

    assert_eq!(campaign.reset_failed().await.unwrap(), 1);
    env.mailer.fail.store(false, Ordering::SeqCst);
    assert!(matches!(
        campaign.process_one().await.unwrap(),
        ProcessOutcome::Sent { .. }
    ));
}

#[tokio::test]
async fn test_process_one_pauses_when_list_exhausted() {
    let env = setup().await;
    let campaign = &env.services.campaign;
    campaign.import_emails("only@example.com").await.unwrap();
    campaign.set_state(CampaignState::Running).await.unwrap();

    assert!(matches!(
        campaign.process_one().await.unwrap(),
        ProcessOutcome::Sent { .. }
    ));
    assert!(matches!(
        campaign.process_one().await.unwrap(),
        ProcessOutcome::Exhausted
    ));
    assert_eq!(campaign.state().await.unwrap(), CampaignState::Paused);

    // 暂停后再调用不会发送
    assert!(matches!(
        campaign.process_one().await.unwrap(),
        ProcessOutcome::Paused
    ));
    assert_eq!(env.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_process_one_never_double_sends() {
    let env = setup().await;
    let campaign = env.services.campaign.clone();
    campaign
        .import_emails("one@example.com\ntwo@example.com")
        .await
        .unwrap();
    campaign.set_state(CampaignState::Running).await.unwrap();

    let a = tokio::spawn({
        let campaign = campaign.clone();
        async move { campaign.process_one().await }
    });
    let b = tokio::spawn({
        let campaign = campaign.clone();
        async move { campaign.process_one().await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let mut recipients: Vec<String> = env
        .mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|m| m.to.clone())
        .collect();
    recipients.sort();
    assert_eq!(recipients, vec!["one@example.com", "two@example.com"]);
}
