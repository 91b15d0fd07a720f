use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 后台任务句柄，关闭时统一通知并等待
pub struct BackgroundTasks {
    pub shutdown_tx: watch::Sender<bool>,
    pub scheduler: Option<JoinHandle<()>>,
}

pub async fn listen_for_shutdown(storage: &SeaOrmStorage, tasks: BackgroundTasks) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping background tasks...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(storage, tasks),
    )
    .await;

    match shutdown_result {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds! Forcing exit.",
                SHUTDOWN_TIMEOUT_SECS
            );
            std::process::exit(1);
        }
    }
}

/// 执行所有关闭任务（在超时内调用）
async fn perform_shutdown_tasks(storage: &SeaOrmStorage, tasks: BackgroundTasks) {
    // 通知调度器退出；正在进行的 process_one 会先完成
    let _ = tasks.shutdown_tx.send(true);
    if let Some(handle) = tasks.scheduler {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), handle).await {
            Ok(Ok(())) => info!("Campaign scheduler stopped"),
            Ok(Err(e)) => error!("Campaign scheduler task failed: {}", e),
            Err(_) => error!(
                "Campaign scheduler did not stop within {} seconds",
                TASK_TIMEOUT_SECS
            ),
        }
    }

    match timeout(
        Duration::from_secs(TASK_TIMEOUT_SECS),
        storage.get_db().clone().close(),
    )
    .await
    {
        Ok(Ok(())) => info!("Database connections closed"),
        Ok(Err(e)) => error!("Failed to close database connections: {}", e),
        Err(_) => error!(
            "Closing database connections timed out after {} seconds",
            TASK_TIMEOUT_SECS
        ),
    }
}
