use std::sync::Arc;

use crate::errors::Result;
use crate::storage::{DashboardStats, SeaOrmStorage};

/// 汇总管理后台首页数据
pub async fn collect_dashboard_stats(storage: &Arc<SeaOrmStorage>) -> Result<DashboardStats> {
    let (total_users, verified_users) = storage.count_users().await?;
    let (total_links, total_clicks) = storage.tracking_totals().await?;
    let total_products = storage.count_products().await?;
    let mailing = storage.mailing_status_counts().await?;

    Ok(DashboardStats {
        total_users,
        verified_users,
        total_links,
        total_clicks,
        total_products,
        mailing,
    })
}
