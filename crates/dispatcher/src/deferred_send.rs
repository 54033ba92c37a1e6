use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use courier_core::{CourierError, CourierResult};
use courier_domain::entities::DeferredMessage;
use courier_domain::ports::{InternalRouter, OutboundEmail, TransportGateway};
use courier_domain::repositories::{DeferredMessageRepository, SenderAccountRepository};
use courier_domain::value_objects::normalize_email;

/// 一次性延迟发送作业
///
/// 到期消息的收件人按内部/外部分流: 匹配托管发信身份的收件人
/// 走内部路由直接入收件箱，其余走投递网关。全部为内部收件人时
/// 完全跳过网关调用。
pub struct DeferredSendJob {
    deferred_repo: Arc<dyn DeferredMessageRepository>,
    sender_repo: Arc<dyn SenderAccountRepository>,
    transport: Arc<dyn TransportGateway>,
    internal_router: Arc<dyn InternalRouter>,
}

impl DeferredSendJob {
    pub fn new(
        deferred_repo: Arc<dyn DeferredMessageRepository>,
        sender_repo: Arc<dyn SenderAccountRepository>,
        transport: Arc<dyn TransportGateway>,
        internal_router: Arc<dyn InternalRouter>,
    ) -> Self {
        Self {
            deferred_repo,
            sender_repo,
            transport,
            internal_router,
        }
    }

    pub async fn run_tick(&self) -> CourierResult<()> {
        let due = self.deferred_repo.find_due(Utc::now()).await?;
        if due.is_empty() {
            return Ok(());
        }
        debug!("本次tick共有 {} 条到期延迟消息", due.len());

        for message in due {
            if let Err(e) = self.deliver(&message).await {
                error!("延迟消息 {} 投递失败: {}", message.id, e);
            }
        }

        Ok(())
    }

    async fn deliver(&self, message: &DeferredMessage) -> CourierResult<()> {
        let from = self
            .sender_repo
            .get_by_id(message.from_account_id)
            .await?
            .ok_or(CourierError::SenderAccountNotFound {
                id: message.from_account_id,
            })?;

        let managed: HashSet<String> = self
            .sender_repo
            .find_active()
            .await?
            .iter()
            .map(|account| normalize_email(&account.address))
            .collect();

        let mut internal = Vec::new();
        let mut external = Vec::new();
        for recipient in &message.recipients {
            let key = normalize_email(recipient);
            if key.is_empty() {
                continue;
            }
            if managed.contains(&key) {
                internal.push(key);
            } else {
                external.push(key);
            }
        }

        for address in &internal {
            let email = OutboundEmail::new(
                from.address.clone(),
                vec![address.clone()],
                message.subject.clone(),
                message.body.clone(),
            );
            self.internal_router.deliver(address, &email).await?;
        }

        if !external.is_empty() {
            let email = OutboundEmail::new(
                from.address.clone(),
                external.clone(),
                message.subject.clone(),
                message.body.clone(),
            );
            self.transport.send(&email).await?;
        } else if !internal.is_empty() {
            debug!("延迟消息 {} 全部为内部收件人，跳过投递网关", message.id);
        }

        self.deferred_repo.mark_sent(message.id).await?;
        info!(
            "延迟消息 {} 投递完成: 内部 {} 外部 {}",
            message.id,
            internal.len(),
            external.len()
        );

        Ok(())
    }
}

#[async_trait]
impl crate::jobs::Job for DeferredSendJob {
    fn name(&self) -> &'static str {
        "deferred-send"
    }

    async fn run(&self) -> CourierResult<()> {
        self.run_tick().await
    }
}
