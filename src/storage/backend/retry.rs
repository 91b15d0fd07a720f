//! Bounded retry for database writes
//!
//! Only transient failures are retried: pool exhaustion, dropped
//! connections, SQLite `database is locked`, and MySQL/PostgreSQL deadlock or
//! serialization aborts. Everything else (unique-index violations in
//! particular) goes straight back to the caller.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 可重试错误的消息特征（统一小写比较）
const TRANSIENT_MARKERS: &[&str] = &[
    "database is locked",
    "database table is locked",
    "deadlock",
    "lock wait timeout",
    "could not serialize access",
    "serialization failure",
];

pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let message = err.to_string().to_lowercase();
            TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次之外的重试次数
    pub retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base: Duration::from_millis(100),
            cap: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let base = Duration::from_millis(config.retry_base_delay_ms.max(1));
        Self {
            retries: config.retry_count,
            base,
            cap: Duration::from_millis(config.retry_max_delay_ms).max(base),
        }
    }

    /// 第 `attempt` 次重试前的等待：base·2^(attempt-1)，封顶后取 [½, 1] 区间的随机值
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        let ceiling = self.base.saturating_mul(factor).min(self.cap);
        let half = ceiling / 2;
        half + half.mul_f64(rand::random::<f64>())
    }

    /// 执行 `op`，瞬时错误按策略重试
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded on retry {}", op_name, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if attempt >= self.retries || !is_transient(&err) {
                return Err(err);
            }

            attempt += 1;
            let delay = self.delay_for(attempt);
            warn!(
                "{} hit a transient database error ({}), retry {}/{} in {:?}",
                op_name, err, attempt, self.retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
