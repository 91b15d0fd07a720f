//! Admin API 邮件活动端点

use actix_web::{Responder, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, trace};

use crate::api::services::common::{
    ImportEmailsBody, IntervalBody, MailingListQuery, PageQuery, PaginatedData,
    PaginationInfo, ResetFailedResponse, api_result,
};
use crate::services::CampaignService;
use crate::storage::CampaignState;

pub async fn get_campaign(campaign: web::Data<Arc<CampaignService>>) -> ActixResult<impl Responder> {
    Ok(api_result(campaign.status().await))
}

async fn switch_state(campaign: &CampaignService, state: CampaignState) -> impl Responder + use<> {
    info!("Admin API: campaign -> {}", state);
    let result = match campaign.set_state(state).await {
        Ok(()) => campaign.status().await,
        Err(e) => Err(e),
    };
    api_result(result)
}

pub async fn start_campaign(
    campaign: web::Data<Arc<CampaignService>>,
) -> ActixResult<impl Responder> {
    Ok(switch_state(&campaign, CampaignState::Running).await)
}

pub async fn pause_campaign(
    campaign: web::Data<Arc<CampaignService>>,
) -> ActixResult<impl Responder> {
    Ok(switch_state(&campaign, CampaignState::Paused).await)
}

pub async fn update_interval(
    campaign: web::Data<Arc<CampaignService>>,
    body: web::Json<IntervalBody>,
) -> ActixResult<impl Responder> {
    let result = match campaign.set_interval(body.minutes).await {
        Ok(()) => campaign.status().await,
        Err(e) => Err(e),
    };
    Ok(api_result(result))
}

/// 立即处理一行（与 CLI send-batch 相同）
pub async fn send_now(campaign: web::Data<Arc<CampaignService>>) -> ActixResult<impl Responder> {
    Ok(api_result(campaign.process_one().await))
}

pub async fn reset_failed(
    campaign: web::Data<Arc<CampaignService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        campaign
            .reset_failed()
            .await
            .map(|requeued| ResetFailedResponse { requeued }),
    ))
}

pub async fn get_mailing_list(
    campaign: web::Data<Arc<CampaignService>>,
    query: web::Query<MailingListQuery>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: mailing list query {:?}", query);
    let (page, page_size) = PageQuery {
        page: query.page,
        page_size: query.page_size,
    }
    .resolve();

    Ok(api_result(
        campaign
            .list_entries(query.status, page, page_size)
            .await
            .map(|(items, total)| PaginatedData {
                items,
                pagination: PaginationInfo::new(page, page_size, total),
            }),
    ))
}

pub async fn import_mailing_list(
    campaign: web::Data<Arc<CampaignService>>,
    body: web::Json<ImportEmailsBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(campaign.import_emails(&body.emails).await))
}
