//! 收件人解析器集成测试
//!
//! 覆盖来源顺序与去重、幂等闸门、空活动结项、禁发名单过滤。

use std::sync::Arc;

use courier_dispatcher::RecipientResolver;
use courier_domain::entities::{CampaignSend, CampaignStatus, DirectoryFilter, RecipientSource};
use courier_domain::repositories::{CampaignRepository, SendRepository};
use courier_testing_utils::{
    CampaignBuilder, ContactBuilder, MockAudienceRepository, MockCampaignRepository,
    MockSendRepository, PlatformUserBuilder,
};

struct ResolverSetup {
    audience_repo: Arc<MockAudienceRepository>,
    send_repo: Arc<MockSendRepository>,
    campaign_repo: Arc<MockCampaignRepository>,
    resolver: RecipientResolver,
}

impl ResolverSetup {
    fn new() -> Self {
        let audience_repo = Arc::new(MockAudienceRepository::new());
        let send_repo = Arc::new(MockSendRepository::new());
        let campaign_repo = Arc::new(MockCampaignRepository::new());
        let resolver = RecipientResolver::new(
            audience_repo.clone(),
            send_repo.clone(),
            campaign_repo.clone(),
        );
        Self {
            audience_repo,
            send_repo,
            campaign_repo,
            resolver,
        }
    }
}

#[tokio::test]
async fn test_duplicate_email_keeps_first_source() {
    let setup = ResolverSetup::new();
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_id(1)
            .with_email("dup@example.com")
            .with_name("Directory Dup")
            .build(),
    );

    // 同一邮箱换大小写加空白再次出现在手工名单与平台用户里
    let campaign = CampaignBuilder::new()
        .include_directory()
        .with_manual("  DUP@Example.COM ", "Manual Dup")
        .include_platform_users()
        .build();
    setup.audience_repo.add_platform_user(
        PlatformUserBuilder::new()
            .with_email("Dup@example.com")
            .build(),
    );

    let created = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(created, 1);
    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, "dup@example.com");
    assert_eq!(rows[0].source, RecipientSource::Directory);
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let setup = ResolverSetup::new();
    let campaign = CampaignBuilder::new()
        .with_manual("a@example.com", "A")
        .with_manual("b@example.com", "B")
        .build();

    let first = setup.resolver.resolve(&campaign).await.unwrap();
    let second = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(setup.send_repo.rows_for_campaign(campaign.id).len(), 2);
}

#[tokio::test]
async fn test_empty_campaign_finalizes_as_sent() {
    let setup = ResolverSetup::new();
    let campaign = setup
        .campaign_repo
        .create(&CampaignBuilder::new().include_directory().build())
        .await
        .unwrap();

    let created = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(created, 0);
    let stored = setup
        .campaign_repo
        .get_by_id(campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, CampaignStatus::Sent);
}

#[tokio::test]
async fn test_suppressed_recipients_are_skipped() {
    let setup = ResolverSetup::new();
    setup.audience_repo.suppress("blocked@example.com");
    setup.audience_repo.add_platform_user(
        PlatformUserBuilder::new()
            .with_id(1)
            .with_email("Blocked@Example.com")
            .build(),
    );
    setup.audience_repo.add_platform_user(
        PlatformUserBuilder::new()
            .with_id(2)
            .with_email("ok@example.com")
            .build(),
    );

    let campaign = CampaignBuilder::new()
        .with_manual("blocked@example.com", "Blocked")
        .include_platform_users()
        .build();

    let created = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(created, 1);
    let rows = setup.send_repo.rows_for_campaign(campaign.id);
    assert_eq!(rows[0].email, "ok@example.com");
    assert_eq!(rows[0].source, RecipientSource::Platform);
}

#[tokio::test]
async fn test_directory_filters_and_exclusions_apply() {
    let setup = ResolverSetup::new();
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_id(1)
            .with_email("warm@example.com")
            .with_tags(&["lead"])
            .with_temperature("warm")
            .owned_by(7)
            .build(),
    );
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_id(2)
            .with_email("cold@example.com")
            .with_tags(&["lead"])
            .with_temperature("cold")
            .build(),
    );
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_id(3)
            .with_email("dnc@example.com")
            .with_tags(&["lead"])
            .with_temperature("warm")
            .do_not_contact()
            .build(),
    );
    setup.audience_repo.add_contact(
        ContactBuilder::new()
            .with_id(4)
            .with_email("excluded@example.com")
            .with_tags(&["lead"])
            .with_temperature("warm")
            .build(),
    );
    setup.audience_repo.exclude_from_campaign(1, "excluded@example.com");

    let campaign = CampaignBuilder::new()
        .with_id(1)
        .with_directory_filter(DirectoryFilter {
            tags: vec!["lead".to_string()],
            temperature: Some("warm".to_string()),
        })
        .build();

    let created = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(created, 1);
    let rows = setup.send_repo.rows_for_campaign(1);
    assert_eq!(rows[0].email, "warm@example.com");
    // 目录行保留归属代表，供固定分配模式使用
    assert_eq!(rows[0].rep_id, Some(7));
}

#[tokio::test]
async fn test_blank_manual_email_is_skipped() {
    let setup = ResolverSetup::new();
    let campaign = CampaignBuilder::new()
        .with_manual("   ", "Blank")
        .with_manual("real@example.com", "Real")
        .build();

    let created = setup.resolver.resolve(&campaign).await.unwrap();

    assert_eq!(created, 1);
    assert_eq!(
        setup.send_repo.rows_for_campaign(campaign.id)[0].email,
        "real@example.com"
    );
}

#[tokio::test]
async fn test_create_batch_skips_existing_rows() {
    let setup = ResolverSetup::new();
    let first = CampaignSend::new(
        1,
        "kept@example.com".to_string(),
        "Kept".to_string(),
        RecipientSource::Manual,
        None,
    );
    setup.send_repo.create_batch(&[first.clone()]).await.unwrap();

    // 重播同一邮箱只计新插入的行
    let replay = CampaignSend::new(
        1,
        "new@example.com".to_string(),
        "New".to_string(),
        RecipientSource::Manual,
        None,
    );
    let inserted = setup
        .send_repo
        .create_batch(&[first, replay])
        .await
        .unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(setup.send_repo.rows_for_campaign(1).len(), 2);
}
