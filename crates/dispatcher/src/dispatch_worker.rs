use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use courier_core::{template, CourierError, CourierResult};
use courier_domain::entities::{Campaign, CampaignSend, CampaignStatus, TimingStrategy};
use courier_domain::ports::{OutboundEmail, TransportGateway};
use courier_domain::repositories::{CampaignRepository, SendRepository};

use crate::campaign_lifecycle::CampaignLifecycle;
use crate::jobs::Job;
use crate::recipient_resolver::RecipientResolver;
use crate::sender_rotator::SenderRotator;
use crate::timing_planner::TimingPlanner;

/// 行级错误类别
///
/// 行级错误在批次循环内被捕获并落到该行上，从不中断批次或tick。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    /// 无发信账户可分配，配置错误，不自动重试
    Configuration,
    /// 模板变量缺失或格式错误
    Template,
    /// 投递网关拒绝或超时，恢复路径是操作员手动重新入队
    Transport,
    /// 行处理过程中的存储错误
    Store,
}

#[derive(Debug)]
pub struct RowError {
    pub kind: RowErrorKind,
    pub message: String,
}

impl RowError {
    fn configuration(message: String) -> Self {
        Self {
            kind: RowErrorKind::Configuration,
            message,
        }
    }
}

impl From<CourierError> for RowError {
    fn from(err: CourierError) -> Self {
        let kind = match &err {
            CourierError::Configuration(_) => RowErrorKind::Configuration,
            CourierError::Template(_) => RowErrorKind::Template,
            CourierError::Transport(_) => RowErrorKind::Transport,
            _ => RowErrorKind::Store,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// 单行投递成功的结果
#[derive(Debug)]
pub struct RowOutcome {
    pub sender_account_id: i64,
    pub confirmation_id: String,
}

/// 分发器: 周期性批处理器
///
/// 每个tick: 提升到期的scheduled活动，对每个sending活动
/// 惰性解析+规划收件人、拉取到期批次、逐行隔离投递、检测结项。
pub struct DispatchWorker {
    campaign_repo: Arc<dyn CampaignRepository>,
    send_repo: Arc<dyn SendRepository>,
    resolver: RecipientResolver,
    planner: TimingPlanner,
    rotator: SenderRotator,
    lifecycle: CampaignLifecycle,
    transport: Arc<dyn TransportGateway>,
}

impl DispatchWorker {
    pub fn new(
        campaign_repo: Arc<dyn CampaignRepository>,
        send_repo: Arc<dyn SendRepository>,
        resolver: RecipientResolver,
        planner: TimingPlanner,
        rotator: SenderRotator,
        lifecycle: CampaignLifecycle,
        transport: Arc<dyn TransportGateway>,
    ) -> Self {
        Self {
            campaign_repo,
            send_repo,
            resolver,
            planner,
            rotator,
            lifecycle,
            transport,
        }
    }

    /// 处理一个tick，tick之间不保留任何内存状态
    pub async fn run_tick(&self) -> CourierResult<()> {
        let now = Utc::now();
        self.lifecycle.promote_due(now).await?;

        let sending = self
            .campaign_repo
            .find_by_status(CampaignStatus::Sending)
            .await?;
        debug!("本次tick共有 {} 个sending活动", sending.len());

        for campaign in sending {
            if let Err(e) = self.process_campaign(&campaign).await {
                // 活动级错误记录后继续处理其余活动，下个tick自然重试
                error!("活动 {} 处理失败: {}", campaign.id, e);
            }
        }

        Ok(())
    }

    async fn process_campaign(&self, campaign: &Campaign) -> CourierResult<()> {
        if self.send_repo.count_for_campaign(campaign.id).await? == 0 {
            let created = self.resolver.resolve(campaign).await?;
            if created == 0 {
                // 空活动已在解析器内结项为sent
                return Ok(());
            }
            self.planner.plan(campaign).await?;
        }

        let now = Utc::now();
        let batch = self
            .send_repo
            .find_due_batch(campaign.id, now, campaign.timing.batch_size)
            .await?;

        if batch.is_empty() {
            if self.send_repo.count_pending_future(campaign.id, now).await? == 0 {
                self.lifecycle.finalize(campaign).await?;
            } else {
                debug!("活动 {} 仍有未来到期的投递行，本tick不动作", campaign.id);
            }
            return Ok(());
        }

        info!("活动 {} 本批次处理 {} 条投递行", campaign.id, batch.len());

        for (index, send) in batch.iter().enumerate() {
            // 只有blast策略在批内做限速延迟，staggered/drip完全靠行级due时间
            if index > 0
                && campaign.timing.strategy == TimingStrategy::Immediate
                && campaign.timing.send_delay_seconds > 0
            {
                tokio::time::sleep(Duration::from_secs(campaign.timing.send_delay_seconds)).await;
            }

            match self.dispatch_row(campaign, send).await {
                Ok(outcome) => {
                    // 状态在网关确认之后才写入: 二者之间崩溃会让下个tick
                    // 重复投递这一行(窄的at-least-once窗口)，网关无法参与
                    // 存储事务，这一权衡向实现者公开而不是悄悄掩盖
                    self.send_repo
                        .mark_sent(send.id, outcome.sender_account_id, &outcome.confirmation_id)
                        .await?;
                    self.rotator
                        .record_dispatch(campaign.id, outcome.sender_account_id)
                        .await?;
                }
                Err(row_err) => {
                    warn!(
                        "投递行 {} 失败({:?}): {}",
                        send.id, row_err.kind, row_err.message
                    );
                    self.send_repo.mark_failed(send.id).await?;
                }
            }
        }

        Ok(())
    }

    /// 单行投递: 选账户 -> 渲染模板 -> 调网关
    ///
    /// 任何一步失败都作为行级错误返回，由调用方落到该行上。
    async fn dispatch_row(
        &self,
        campaign: &Campaign,
        send: &CampaignSend,
    ) -> Result<RowOutcome, RowError> {
        let account = self.rotator.pick(campaign, send).await?;
        let Some(account) = account else {
            return Err(RowError::configuration(format!(
                "投递行 {} 无可用发信账户",
                send.id
            )));
        };

        let vars = send.template_vars();
        let subject = template::render(&campaign.subject_template, &vars)?;
        let body = template::render(&campaign.body_template, &vars)?;

        let email = OutboundEmail::new(
            account.address.clone(),
            vec![send.email.clone()],
            subject,
            body,
        );
        let confirmation_id = self.transport.send(&email).await?;

        Ok(RowOutcome {
            sender_account_id: account.id,
            confirmation_id,
        })
    }
}

#[async_trait]
impl Job for DispatchWorker {
    fn name(&self) -> &'static str {
        "campaign-dispatch"
    }

    async fn run(&self) -> CourierResult<()> {
        self.run_tick().await
    }
}
