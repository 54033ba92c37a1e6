use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use courier_core::CourierResult;
use courier_domain::entities::{Campaign, CampaignStats, CampaignStatus};
use courier_domain::repositories::{CampaignRepository, SendRepository};

/// 活动生命周期: draft -> scheduled -> sending -> sent
///
/// 没有failed状态。行级失败体现在汇总统计里，
/// 所有投递行到达终态后活动总会结项为sent。
pub struct CampaignLifecycle {
    campaign_repo: Arc<dyn CampaignRepository>,
    send_repo: Arc<dyn SendRepository>,
}

impl CampaignLifecycle {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        send_repo: Arc<dyn SendRepository>,
    ) -> Self {
        Self {
            campaign_repo,
            send_repo,
        }
    }

    /// 把定时时间已到达的scheduled活动提升为sending，返回提升数量
    pub async fn promote_due(&self, now: DateTime<Utc>) -> CourierResult<usize> {
        let due = self.campaign_repo.find_due_scheduled(now).await?;
        for campaign in &due {
            self.campaign_repo
                .update_status(campaign.id, CampaignStatus::Sending)
                .await?;
            info!("活动 {} ({}) 到达定时时间，进入sending", campaign.id, campaign.name);
        }
        Ok(due.len())
    }

    /// 结项: 从投递行重新计算汇总统计并写回，然后置为sent
    pub async fn finalize(&self, campaign: &Campaign) -> CourierResult<CampaignStats> {
        let rollup = self.send_repo.status_rollup(campaign.id).await?;
        let stats = CampaignStats {
            total_sent: rollup.sent,
            total_failed: rollup.failed,
            total_bounced: rollup.bounced,
        };

        self.campaign_repo.update_stats(campaign.id, &stats).await?;
        self.campaign_repo
            .update_status(campaign.id, CampaignStatus::Sent)
            .await?;

        info!(
            "活动 {} 结项: sent={} failed={} bounced={}",
            campaign.id, stats.total_sent, stats.total_failed, stats.total_bounced
        );

        Ok(stats)
    }
}
