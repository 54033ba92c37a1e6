//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，每个实体一个窄接口，
//! 按目标持久化技术实现一次。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_core::CourierResult;

use crate::entities::{
    Campaign, CampaignSend, CampaignSenderLink, CampaignStats, CampaignStatus, Contact,
    DeferredMessage, DirectoryFilter, PlatformFilter, PlatformUser, SendStatus, SenderAccount,
    SequenceEnrollment, SequenceStep, Thread,
};

/// 营销活动仓储抽象
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: &Campaign) -> CourierResult<Campaign>;
    async fn get_by_id(&self, id: i64) -> CourierResult<Option<Campaign>>;
    async fn find_by_status(&self, status: CampaignStatus) -> CourierResult<Vec<Campaign>>;
    /// scheduled状态且定时时间为空或已到达的活动
    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> CourierResult<Vec<Campaign>>;
    async fn update_status(&self, id: i64, status: CampaignStatus) -> CourierResult<()>;
    async fn update_stats(&self, id: i64, stats: &CampaignStats) -> CourierResult<()>;
}

/// 按状态统计的投递行数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendRollup {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub bounced: i64,
}

impl SendRollup {
    pub fn total(&self) -> i64 {
        self.pending + self.sent + self.failed + self.bounced
    }
}

/// 投递行仓储抽象
#[async_trait]
pub trait SendRepository: Send + Sync {
    async fn create_batch(&self, sends: &[CampaignSend]) -> CourierResult<usize>;
    async fn count_for_campaign(&self, campaign_id: i64) -> CourierResult<i64>;
    /// pending且尚未规划发送时间的行，按创建顺序
    async fn find_unplanned(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSend>>;
    async fn set_due_at(&self, send_id: i64, due_at: DateTime<Utc>) -> CourierResult<()>;
    /// pending且(无due时间或已到期)的行，due升序(空值在前)再按创建顺序
    async fn find_due_batch(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
        limit: i64,
    ) -> CourierResult<Vec<CampaignSend>>;
    /// 仍在等待未来due时间的pending行数
    async fn count_pending_future(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
    ) -> CourierResult<i64>;
    async fn mark_sent(
        &self,
        send_id: i64,
        sender_account_id: i64,
        confirmation_id: &str,
    ) -> CourierResult<()>;
    async fn mark_failed(&self, send_id: i64) -> CourierResult<()>;
    async fn update_status(&self, send_id: i64, status: SendStatus) -> CourierResult<()>;
    async fn status_rollup(&self, campaign_id: i64) -> CourierResult<SendRollup>;
}

/// 发信账户仓储抽象
#[async_trait]
pub trait SenderAccountRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> CourierResult<Option<SenderAccount>>;
    async fn find_active(&self) -> CourierResult<Vec<SenderAccount>>;
    async fn find_active_by_owner(&self, rep_id: i64) -> CourierResult<Option<SenderAccount>>;
    /// 活动的注册关系，times_used升序再按注册时间
    async fn registrations(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSenderLink>>;
    async fn register(&self, campaign_id: i64, account_id: i64) -> CourierResult<()>;
    async fn increment_times_used(&self, campaign_id: i64, account_id: i64) -> CourierResult<()>;
}

/// 序列仓储抽象(注册与步骤)
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// active且next_due已到期的注册
    async fn find_due_enrollments(
        &self,
        now: DateTime<Utc>,
    ) -> CourierResult<Vec<SequenceEnrollment>>;
    async fn update_enrollment(&self, enrollment: &SequenceEnrollment) -> CourierResult<()>;
    async fn find_step(
        &self,
        sequence_id: i64,
        step_number: i32,
    ) -> CourierResult<Option<SequenceStep>>;
}

/// 收件人来源仓储抽象
///
/// 目录查询已排除do-not-contact和活动排除名单；
/// is_suppressed是跨来源的退订/禁发检查。
#[async_trait]
pub trait AudienceRepository: Send + Sync {
    async fn directory_contacts(
        &self,
        campaign_id: i64,
        filter: &DirectoryFilter,
    ) -> CourierResult<Vec<Contact>>;
    async fn platform_users(&self, filter: &PlatformFilter) -> CourierResult<Vec<PlatformUser>>;
    async fn is_suppressed(&self, email: &str) -> CourierResult<bool>;
}

/// 延迟消息仓储抽象
#[async_trait]
pub trait DeferredMessageRepository: Send + Sync {
    async fn find_due(&self, now: DateTime<Utc>) -> CourierResult<Vec<DeferredMessage>>;
    async fn mark_sent(&self, id: i64) -> CourierResult<()>;
}

/// 会话线程仓储抽象
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn find_or_create(&self, recipient_email: &str, subject: &str) -> CourierResult<Thread>;
    async fn record_message(
        &self,
        thread_id: i64,
        from_address: &str,
        body: &str,
        confirmation_id: Option<&str>,
    ) -> CourierResult<()>;
}
