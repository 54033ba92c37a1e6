use std::sync::Arc;

use tracing::debug;

use courier_core::CourierResult;
use courier_domain::entities::{Campaign, CampaignSend, SenderAccount, SenderMode};
use courier_domain::repositories::SenderAccountRepository;

/// 发信账户选取器
///
/// 固定分配模式按收件人归属代表查找账户；轮询模式在活动注册的
/// 活跃账户中选公平计数最低的，注册时间早者优先打破平局。
pub struct SenderRotator {
    sender_repo: Arc<dyn SenderAccountRepository>,
}

impl SenderRotator {
    pub fn new(sender_repo: Arc<dyn SenderAccountRepository>) -> Self {
        Self { sender_repo }
    }

    /// 为一条投递行选取发信账户
    ///
    /// 返回None表示无账户可用，调用方将该行标记failed——
    /// 这是配置错误而非瞬时故障，不自动重试。
    pub async fn pick(
        &self,
        campaign: &Campaign,
        send: &CampaignSend,
    ) -> CourierResult<Option<SenderAccount>> {
        match campaign.sender_mode {
            SenderMode::OwnerMapped => {
                let Some(rep_id) = send.rep_id else {
                    debug!("投递行 {} 没有归属代表，无法固定分配", send.id);
                    return Ok(None);
                };
                self.sender_repo.find_active_by_owner(rep_id).await
            }
            SenderMode::RoundRobin { all_active } => {
                let mut registrations = self.sender_repo.registrations(campaign.id).await?;

                if registrations.is_empty() && all_active {
                    for account in self.sender_repo.find_active().await? {
                        self.sender_repo.register(campaign.id, account.id).await?;
                    }
                    registrations = self.sender_repo.registrations(campaign.id).await?;
                }

                // 仓储按times_used升序、注册时间升序返回
                for registration in registrations {
                    if let Some(account) =
                        self.sender_repo.get_by_id(registration.account_id).await?
                    {
                        if account.is_active() {
                            return Ok(Some(account));
                        }
                    }
                }

                Ok(None)
            }
        }
    }

    /// 投递确认成功后递增公平计数器
    ///
    /// 只在网关确认之后调用，失败的投递不会不公平地推进轮询。
    pub async fn record_dispatch(&self, campaign_id: i64, account_id: i64) -> CourierResult<()> {
        self.sender_repo
            .increment_times_used(campaign_id, account_id)
            .await
    }
}
