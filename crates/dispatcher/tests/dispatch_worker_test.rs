//! 分发器端到端集成测试
//!
//! 用内存仓储和网关替身驱动完整tick: 定时提升、惰性解析与规划、
//! 批次投递、行级错误隔离和结项统计。

use std::sync::Arc;

use chrono::{Duration, Utc};

use courier_dispatcher::{
    CampaignLifecycle, DispatchWorker, RecipientResolver, SenderRotator, TimingPlanner,
};
use courier_domain::entities::{Campaign, CampaignStatus, SendStatus};
use courier_domain::repositories::{CampaignRepository, SendRepository};
use courier_testing_utils::{
    CampaignBuilder, MockAudienceRepository, MockCampaignRepository, MockSendRepository,
    MockSenderAccountRepository, MockTransportGateway, SenderAccountBuilder,
};

struct WorkerSetup {
    campaign_repo: Arc<MockCampaignRepository>,
    send_repo: Arc<MockSendRepository>,
    sender_repo: Arc<MockSenderAccountRepository>,
    audience_repo: Arc<MockAudienceRepository>,
    transport: Arc<MockTransportGateway>,
    worker: DispatchWorker,
}

impl WorkerSetup {
    fn new() -> Self {
        let campaign_repo = Arc::new(MockCampaignRepository::new());
        let send_repo = Arc::new(MockSendRepository::new());
        let sender_repo = Arc::new(MockSenderAccountRepository::new());
        let audience_repo = Arc::new(MockAudienceRepository::new());
        let transport = Arc::new(MockTransportGateway::new());

        let resolver = RecipientResolver::new(
            audience_repo.clone(),
            send_repo.clone(),
            campaign_repo.clone(),
        );
        let planner = TimingPlanner::with_seed(send_repo.clone(), 42);
        let rotator = SenderRotator::new(sender_repo.clone());
        let lifecycle = CampaignLifecycle::new(campaign_repo.clone(), send_repo.clone());
        let worker = DispatchWorker::new(
            campaign_repo.clone(),
            send_repo.clone(),
            resolver,
            planner,
            rotator,
            lifecycle,
            transport.clone(),
        );

        Self {
            campaign_repo,
            send_repo,
            sender_repo,
            audience_repo,
            transport,
            worker,
        }
    }

    fn with_default_sender(self) -> Self {
        self.sender_repo
            .add_account(SenderAccountBuilder::new().build());
        self
    }

    async fn add_campaign(&self, campaign: Campaign) -> Campaign {
        self.campaign_repo.create(&campaign).await.unwrap()
    }

    async fn campaign(&self, id: i64) -> Campaign {
        self.campaign_repo.get_by_id(id).await.unwrap().unwrap()
    }
}

fn blast_campaign(recipients: &[&str]) -> Campaign {
    let mut builder = CampaignBuilder::new().immediate();
    for (i, email) in recipients.iter().enumerate() {
        builder = builder.with_manual(email, &format!("Recipient {i}"));
    }
    builder.build()
}

#[tokio::test]
async fn test_full_blast_campaign_finalizes_with_stats() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(blast_campaign(&["a@x.com", "b@x.com", "c@x.com"]))
        .await;

    // 第一个tick: 解析+规划+整批投递
    setup.worker.run_tick().await.unwrap();
    assert_eq!(setup.transport.sent_count(), 3);
    assert_eq!(setup.campaign(campaign.id).await.status, CampaignStatus::Sending);

    // 第二个tick: 批次为空且无未来行，结项
    setup.worker.run_tick().await.unwrap();
    let finished = setup.campaign(campaign.id).await;
    assert_eq!(finished.status, CampaignStatus::Sent);
    assert_eq!(finished.stats.total_sent, 3);
    assert_eq!(finished.stats.total_failed, 0);
}

#[tokio::test]
async fn test_row_failure_does_not_stop_batch() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(blast_campaign(&[
            "a@x.com", "b@x.com", "bad@x.com", "d@x.com", "e@x.com",
        ]))
        .await;
    setup.transport.fail_for("bad@x.com");

    setup.worker.run_tick().await.unwrap();

    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    let sent = rows.iter().filter(|r| r.status == SendStatus::Sent).count();
    let failed: Vec<_> = rows.iter().filter(|r| r.status == SendStatus::Failed).collect();
    assert_eq!(sent, 4);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].email, "bad@x.com");

    setup.worker.run_tick().await.unwrap();
    let finished = setup.campaign(campaign.id).await;
    assert_eq!(finished.status, CampaignStatus::Sent);
    assert_eq!(finished.stats.total_sent, 4);
    assert_eq!(finished.stats.total_failed, 1);
}

#[tokio::test]
async fn test_rows_are_not_dispatched_twice() {
    let setup = WorkerSetup::new().with_default_sender();
    setup.add_campaign(blast_campaign(&["a@x.com", "b@x.com"])).await;

    setup.worker.run_tick().await.unwrap();
    setup.worker.run_tick().await.unwrap();
    setup.worker.run_tick().await.unwrap();

    // 已终态的行不会再进入到期批次
    assert_eq!(setup.transport.sent_count(), 2);
}

#[tokio::test]
async fn test_sent_rows_carry_confirmation_and_account() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup.add_campaign(blast_campaign(&["a@x.com"])).await;

    setup.worker.run_tick().await.unwrap();

    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows[0].status, SendStatus::Sent);
    assert_eq!(rows[0].sender_account_id, Some(1));
    assert!(rows[0].confirmation_id.as_deref().unwrap().starts_with("conf-"));
}

#[tokio::test]
async fn test_due_scheduled_campaign_is_promoted_and_dispatched() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(
            CampaignBuilder::new()
                .with_status(CampaignStatus::Scheduled)
                .scheduled_at(Utc::now() - Duration::minutes(5))
                .immediate()
                .with_manual("a@x.com", "A")
                .build(),
        )
        .await;

    setup.worker.run_tick().await.unwrap();

    // 提升与投递发生在同一个tick内
    assert_eq!(setup.transport.sent_count(), 1);
    assert_eq!(setup.campaign(campaign.id).await.status, CampaignStatus::Sending);
}

#[tokio::test]
async fn test_future_scheduled_campaign_stays_put() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(
            CampaignBuilder::new()
                .with_status(CampaignStatus::Scheduled)
                .scheduled_at(Utc::now() + Duration::hours(2))
                .with_manual("a@x.com", "A")
                .build(),
        )
        .await;

    setup.worker.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    assert_eq!(setup.campaign(campaign.id).await.status, CampaignStatus::Scheduled);
}

#[tokio::test]
async fn test_future_due_rows_defer_finalization() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(
            CampaignBuilder::new()
                .staggered(30)
                .with_manual("a@x.com", "A")
                .with_manual("b@x.com", "B")
                .with_manual("c@x.com", "C")
                .build(),
        )
        .await;

    // 只有第一行立即到期，其余每隔30分钟
    setup.worker.run_tick().await.unwrap();
    assert_eq!(setup.transport.sent_count(), 1);

    setup.worker.run_tick().await.unwrap();
    let status = setup.campaign(campaign.id).await.status;
    assert_eq!(status, CampaignStatus::Sending);
    assert_eq!(
        setup
            .send_repo
            .count_pending_future(campaign.id, Utc::now())
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_batch_size_caps_rows_per_tick() {
    let setup = WorkerSetup::new().with_default_sender();
    setup
        .add_campaign(
            CampaignBuilder::new()
                .immediate()
                .with_batch_size(2)
                .with_manual("a@x.com", "A")
                .with_manual("b@x.com", "B")
                .with_manual("c@x.com", "C")
                .build(),
        )
        .await;

    setup.worker.run_tick().await.unwrap();
    assert_eq!(setup.transport.sent_count(), 2);

    setup.worker.run_tick().await.unwrap();
    assert_eq!(setup.transport.sent_count(), 3);
}

#[tokio::test]
async fn test_missing_sender_account_fails_row_without_gateway_call() {
    // 没有任何发信账户: 行级配置错误，逐行落failed，网关不被调用
    let setup = WorkerSetup::new();
    let campaign = setup.add_campaign(blast_campaign(&["a@x.com"])).await;

    setup.worker.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows[0].status, SendStatus::Failed);

    setup.worker.run_tick().await.unwrap();
    let finished = setup.campaign(campaign.id).await;
    assert_eq!(finished.status, CampaignStatus::Sent);
    assert_eq!(finished.stats.total_failed, 1);
}

#[tokio::test]
async fn test_requeued_failed_row_is_dispatched_next_tick() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup.add_campaign(blast_campaign(&["flaky@x.com"])).await;
    setup.transport.fail_for("flaky@x.com");

    setup.worker.run_tick().await.unwrap();
    let row = setup.send_repo.rows_for_campaign(campaign.id)[0].clone();
    assert_eq!(row.status, SendStatus::Failed);

    // 操作员排除故障后手动把行改回pending重新入队
    setup.transport.clear_failures();
    setup
        .send_repo
        .update_status(row.id, SendStatus::Pending)
        .await
        .unwrap();

    setup.worker.run_tick().await.unwrap();
    assert_eq!(setup.transport.sent_count(), 1);
    let row = setup.send_repo.rows_for_campaign(campaign.id)[0].clone();
    assert_eq!(row.status, SendStatus::Sent);
}

#[tokio::test]
async fn test_broken_template_fails_row() {
    let setup = WorkerSetup::new().with_default_sender();
    let campaign = setup
        .add_campaign(
            CampaignBuilder::new()
                .immediate()
                .with_subject("Hello {{unknown_var}}")
                .with_manual("a@x.com", "A")
                .build(),
        )
        .await;

    setup.worker.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows[0].status, SendStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_send_delay_paces_batch_rows() {
    let setup = WorkerSetup::new().with_default_sender();
    setup
        .add_campaign(
            CampaignBuilder::new()
                .immediate()
                .with_send_delay(5)
                .with_manual("a@x.com", "A")
                .with_manual("b@x.com", "B")
                .with_manual("c@x.com", "C")
                .build(),
        )
        .await;

    let start = tokio::time::Instant::now();
    setup.worker.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 3);
    // 第一行不延迟，后两行各等5秒
    assert!(start.elapsed() >= std::time::Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_staggered_rows_do_not_use_send_delay() {
    let setup = WorkerSetup::new().with_default_sender();
    setup
        .add_campaign(
            CampaignBuilder::new()
                .staggered(30)
                .with_send_delay(5)
                .with_manual("a@x.com", "A")
                .with_manual("b@x.com", "B")
                .build(),
        )
        .await;

    let start = tokio::time::Instant::now();
    setup.worker.run_tick().await.unwrap();

    // 错峰行完全靠行级due时间，批内没有人为睡眠
    assert_eq!(setup.transport.sent_count(), 1);
    assert_eq!(start.elapsed(), std::time::Duration::ZERO);
}

#[tokio::test]
async fn test_directory_audience_flows_through_dispatch() {
    use courier_testing_utils::ContactBuilder;

    let setup = WorkerSetup::new().with_default_sender();
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_email("lead@x.com")
            .with_name("Lead One")
            .build(),
    );
    let campaign = setup
        .add_campaign(CampaignBuilder::new().immediate().include_directory().build())
        .await;

    setup.worker.run_tick().await.unwrap();

    let sent = setup.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_addresses, vec!["lead@x.com".to_string()]);
    assert_eq!(sent[0].subject, "Hello Lead");
    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows[0].status, SendStatus::Sent);
}
