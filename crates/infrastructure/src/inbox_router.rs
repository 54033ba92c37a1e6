use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use courier_core::CourierResult;
use courier_domain::ports::{InternalRouter, OutboundEmail};
use courier_domain::repositories::ThreadRepository;

/// 基于会话线程表的内部路由
///
/// 收件人是托管发信身份时直接把消息写进其收件箱线程，
/// 不触达外部投递网关。
pub struct InboxRouter {
    thread_repo: Arc<dyn ThreadRepository>,
}

impl InboxRouter {
    pub fn new(thread_repo: Arc<dyn ThreadRepository>) -> Self {
        Self { thread_repo }
    }
}

#[async_trait]
impl InternalRouter for InboxRouter {
    async fn deliver(&self, recipient_address: &str, email: &OutboundEmail) -> CourierResult<()> {
        let thread = self
            .thread_repo
            .find_or_create(recipient_address, &email.subject)
            .await?;
        self.thread_repo
            .record_message(thread.id, &email.from_address, &email.html_body, None)
            .await?;
        debug!("内部路由投递到 {} (线程 {})", recipient_address, thread.id);
        Ok(())
    }
}
