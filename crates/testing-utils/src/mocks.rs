//! 内存版仓储实现，供单元与集成测试使用
//!
//! 语义与Postgres实现保持一致，特别是排序约定:
//! 到期批次按due升序(空值在前)再按创建顺序；
//! 注册关系按times_used升序再按注册时间。

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use courier_core::CourierResult;
use courier_domain::entities::{
    Campaign, CampaignSend, CampaignSenderLink, CampaignStats, CampaignStatus, Contact,
    DeferredMessage, DeferredStatus, DirectoryFilter, PlatformFilter, PlatformUser, SendStatus,
    SenderAccount, SequenceEnrollment, SequenceStep, Thread, ThreadMessage,
};
use courier_domain::repositories::{
    AudienceRepository, CampaignRepository, DeferredMessageRepository, SendRepository, SendRollup,
    SenderAccountRepository, SequenceRepository, ThreadRepository,
};
use courier_domain::value_objects::normalize_email;

#[derive(Default)]
pub struct MockCampaignRepository {
    campaigns: Mutex<Vec<Campaign>>,
    next_id: AtomicI64,
}

impl MockCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepository for MockCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> CourierResult<Campaign> {
        let mut stored = campaign.clone();
        if stored.id == 0 {
            stored.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        }
        self.campaigns.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> CourierResult<Option<Campaign>> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_status(&self, status: CampaignStatus) -> CourierResult<Vec<Campaign>> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> CourierResult<Vec<Campaign>> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.status == CampaignStatus::Scheduled
                    && c.scheduled_at.map(|t| t <= now).unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: i64, status: CampaignStatus) -> CourierResult<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.status = status;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_stats(&self, id: i64, stats: &CampaignStats) -> CourierResult<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.stats = *stats;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSendRepository {
    rows: Mutex<Vec<CampaignSend>>,
    next_id: AtomicI64,
}

impl MockSendRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_rows(&self) -> Vec<CampaignSend> {
        self.rows.lock().unwrap().clone()
    }

    pub fn rows_for_campaign(&self, campaign_id: i64) -> Vec<CampaignSend> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.campaign_id == campaign_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SendRepository for MockSendRepository {
    async fn create_batch(&self, sends: &[CampaignSend]) -> CourierResult<usize> {
        let mut rows = self.rows.lock().unwrap();
        let mut inserted = 0usize;
        for send in sends {
            // 与库表唯一索引(campaign_id, email)对齐: 冲突行静默跳过
            if rows
                .iter()
                .any(|r| r.campaign_id == send.campaign_id && r.email == send.email)
            {
                continue;
            }
            let mut stored = send.clone();
            stored.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            rows.push(stored);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn count_for_campaign(&self, campaign_id: i64) -> CourierResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.campaign_id == campaign_id)
            .count() as i64)
    }

    async fn find_unplanned(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSend>> {
        let mut rows: Vec<CampaignSend> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.campaign_id == campaign_id
                    && r.status == SendStatus::Pending
                    && r.due_at.is_none()
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn set_due_at(&self, send_id: i64, due_at: DateTime<Utc>) -> CourierResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == send_id) {
            row.due_at = Some(due_at);
        }
        Ok(())
    }

    async fn find_due_batch(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
        limit: i64,
    ) -> CourierResult<Vec<CampaignSend>> {
        let mut rows: Vec<CampaignSend> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.campaign_id == campaign_id
                    && r.status == SendStatus::Pending
                    && r.due_at.map(|due| due <= now).unwrap_or(true)
            })
            .cloned()
            .collect();
        // Option排序天然满足空值在前
        rows.sort_by_key(|r| (r.due_at, r.id));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_pending_future(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
    ) -> CourierResult<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.campaign_id == campaign_id
                    && r.status == SendStatus::Pending
                    && r.due_at.map(|due| due > now).unwrap_or(false)
            })
            .count() as i64)
    }

    async fn mark_sent(
        &self,
        send_id: i64,
        sender_account_id: i64,
        confirmation_id: &str,
    ) -> CourierResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == send_id && r.status == SendStatus::Pending)
        {
            row.status = SendStatus::Sent;
            row.sender_account_id = Some(sender_account_id);
            row.confirmation_id = Some(confirmation_id.to_string());
        }
        Ok(())
    }

    async fn mark_failed(&self, send_id: i64) -> CourierResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == send_id && r.status == SendStatus::Pending)
        {
            row.status = SendStatus::Failed;
        }
        Ok(())
    }

    async fn update_status(&self, send_id: i64, status: SendStatus) -> CourierResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == send_id) {
            row.status = status;
        }
        Ok(())
    }

    async fn status_rollup(&self, campaign_id: i64) -> CourierResult<SendRollup> {
        let rows = self.rows.lock().unwrap();
        let mut rollup = SendRollup::default();
        for row in rows.iter().filter(|r| r.campaign_id == campaign_id) {
            match row.status {
                SendStatus::Pending => rollup.pending += 1,
                SendStatus::Sent => rollup.sent += 1,
                SendStatus::Failed => rollup.failed += 1,
                SendStatus::Bounced => rollup.bounced += 1,
            }
        }
        Ok(rollup)
    }
}

#[derive(Default)]
pub struct MockSenderAccountRepository {
    accounts: Mutex<Vec<SenderAccount>>,
    links: Mutex<Vec<CampaignSenderLink>>,
    registration_seq: AtomicI64,
}

impl MockSenderAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: SenderAccount) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn links_for_campaign(&self, campaign_id: i64) -> Vec<CampaignSenderLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.campaign_id == campaign_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SenderAccountRepository for MockSenderAccountRepository {
    async fn get_by_id(&self, id: i64) -> CourierResult<Option<SenderAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_active(&self) -> CourierResult<Vec<SenderAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.active)
            .cloned()
            .collect())
    }

    async fn find_active_by_owner(&self, rep_id: i64) -> CourierResult<Option<SenderAccount>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.active && a.owner_rep_id == Some(rep_id))
            .cloned())
    }

    async fn registrations(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSenderLink>> {
        let mut links: Vec<CampaignSenderLink> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.campaign_id == campaign_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.times_used, l.registered_at));
        Ok(links)
    }

    async fn register(&self, campaign_id: i64, account_id: i64) -> CourierResult<()> {
        // 单调偏移保证注册顺序可复现
        let seq = self.registration_seq.fetch_add(1, Ordering::SeqCst);
        self.links.lock().unwrap().push(CampaignSenderLink {
            campaign_id,
            account_id,
            times_used: 0,
            registered_at: Utc::now() + Duration::milliseconds(seq),
        });
        Ok(())
    }

    async fn increment_times_used(&self, campaign_id: i64, account_id: i64) -> CourierResult<()> {
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links
            .iter_mut()
            .find(|l| l.campaign_id == campaign_id && l.account_id == account_id)
        {
            link.times_used += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSequenceRepository {
    enrollments: Mutex<Vec<SequenceEnrollment>>,
    steps: Mutex<Vec<SequenceStep>>,
}

impl MockSequenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enrollment(&self, enrollment: SequenceEnrollment) {
        self.enrollments.lock().unwrap().push(enrollment);
    }

    pub fn add_step(&self, step: SequenceStep) {
        self.steps.lock().unwrap().push(step);
    }

    pub fn enrollment(&self, id: i64) -> Option<SequenceEnrollment> {
        self.enrollments
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }
}

#[async_trait]
impl SequenceRepository for MockSequenceRepository {
    async fn find_due_enrollments(
        &self,
        now: DateTime<Utc>,
    ) -> CourierResult<Vec<SequenceEnrollment>> {
        Ok(self
            .enrollments
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_active() && e.next_due_at.map(|t| t <= now).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn update_enrollment(&self, enrollment: &SequenceEnrollment) -> CourierResult<()> {
        let mut enrollments = self.enrollments.lock().unwrap();
        if let Some(stored) = enrollments.iter_mut().find(|e| e.id == enrollment.id) {
            *stored = enrollment.clone();
        }
        Ok(())
    }

    async fn find_step(
        &self,
        sequence_id: i64,
        step_number: i32,
    ) -> CourierResult<Option<SequenceStep>> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.sequence_id == sequence_id && s.step_number == step_number)
            .cloned())
    }
}

#[derive(Default)]
pub struct MockAudienceRepository {
    contacts: Mutex<Vec<Contact>>,
    platform_users: Mutex<Vec<PlatformUser>>,
    suppressed: Mutex<HashSet<String>>,
    campaign_exclusions: Mutex<HashSet<(i64, String)>>,
}

impl MockAudienceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contact(&self, contact: Contact) {
        self.contacts.lock().unwrap().push(contact);
    }

    pub fn add_platform_user(&self, user: PlatformUser) {
        self.platform_users.lock().unwrap().push(user);
    }

    pub fn suppress(&self, email: &str) {
        self.suppressed
            .lock()
            .unwrap()
            .insert(normalize_email(email));
    }

    pub fn exclude_from_campaign(&self, campaign_id: i64, email: &str) {
        self.campaign_exclusions
            .lock()
            .unwrap()
            .insert((campaign_id, normalize_email(email)));
    }
}

#[async_trait]
impl AudienceRepository for MockAudienceRepository {
    async fn directory_contacts(
        &self,
        campaign_id: i64,
        filter: &DirectoryFilter,
    ) -> CourierResult<Vec<Contact>> {
        let exclusions = self.campaign_exclusions.lock().unwrap().clone();
        Ok(self
            .contacts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                if c.do_not_contact {
                    return false;
                }
                if exclusions.contains(&(campaign_id, normalize_email(&c.email))) {
                    return false;
                }
                if !filter.tags.is_empty() && !filter.tags.iter().any(|t| c.tags.contains(t)) {
                    return false;
                }
                if let Some(temperature) = &filter.temperature {
                    if c.temperature.as_deref() != Some(temperature.as_str()) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect())
    }

    async fn platform_users(&self, filter: &PlatformFilter) -> CourierResult<Vec<PlatformUser>> {
        Ok(self
            .platform_users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| {
                if filter.reps_only && !u.is_rep {
                    return false;
                }
                if !filter.tiers.is_empty() {
                    match &u.tier {
                        Some(tier) if filter.tiers.contains(tier) => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect())
    }

    async fn is_suppressed(&self, email: &str) -> CourierResult<bool> {
        Ok(self
            .suppressed
            .lock()
            .unwrap()
            .contains(&normalize_email(email)))
    }
}

#[derive(Default)]
pub struct MockDeferredMessageRepository {
    messages: Mutex<Vec<DeferredMessage>>,
}

impl MockDeferredMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&self, message: DeferredMessage) {
        self.messages.lock().unwrap().push(message);
    }

    pub fn message(&self, id: i64) -> Option<DeferredMessage> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }
}

#[async_trait]
impl DeferredMessageRepository for MockDeferredMessageRepository {
    async fn find_due(&self, now: DateTime<Utc>) -> CourierResult<Vec<DeferredMessage>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.status == DeferredStatus::Pending && m.due_at <= now)
            .cloned()
            .collect())
    }

    async fn mark_sent(&self, id: i64) -> CourierResult<()> {
        let mut messages = self.messages.lock().unwrap();
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            message.status = DeferredStatus::Sent;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockThreadRepository {
    threads: Mutex<Vec<Thread>>,
    messages: Mutex<Vec<ThreadMessage>>,
    next_thread_id: AtomicI64,
    next_message_id: AtomicI64,
}

impl MockThreadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.threads.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<ThreadMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThreadRepository for MockThreadRepository {
    async fn find_or_create(&self, recipient_email: &str, subject: &str) -> CourierResult<Thread> {
        let key = normalize_email(recipient_email);
        let mut threads = self.threads.lock().unwrap();
        if let Some(thread) = threads
            .iter()
            .find(|t| normalize_email(&t.recipient_email) == key && t.subject == subject)
        {
            return Ok(thread.clone());
        }
        let thread = Thread {
            id: self.next_thread_id.fetch_add(1, Ordering::SeqCst) + 1,
            recipient_email: recipient_email.to_string(),
            subject: subject.to_string(),
            created_at: Utc::now(),
        };
        threads.push(thread.clone());
        Ok(thread)
    }

    async fn record_message(
        &self,
        thread_id: i64,
        from_address: &str,
        body: &str,
        confirmation_id: Option<&str>,
    ) -> CourierResult<()> {
        self.messages.lock().unwrap().push(ThreadMessage {
            id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
            thread_id,
            from_address: from_address.to_string(),
            body: body.to_string(),
            confirmation_id: confirmation_id.map(|s| s.to_string()),
            sent_at: Utc::now(),
        });
        Ok(())
    }
}
