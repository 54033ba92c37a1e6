//! 发信账户选取集成测试
//!
//! 覆盖轮询公平性、自动注册、非活跃账户跳过与固定分配模式。

use std::sync::Arc;

use courier_dispatcher::SenderRotator;
use courier_domain::entities::{CampaignSend, RecipientSource};
use courier_domain::repositories::SenderAccountRepository;
use courier_testing_utils::{CampaignBuilder, MockSenderAccountRepository, SenderAccountBuilder};

fn send_row(campaign_id: i64, rep_id: Option<i64>) -> CampaignSend {
    CampaignSend::new(
        campaign_id,
        "lead@example.com".to_string(),
        "Lead".to_string(),
        RecipientSource::Directory,
        rep_id,
    )
}

#[tokio::test]
async fn test_round_robin_balances_across_accounts() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).with_address("a@corp.com").build());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(2).with_address("b@corp.com").build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().round_robin(true).build();
    let send = send_row(campaign.id, None);

    // 四次投递确认后两个账户的公平计数应持平
    for _ in 0..4 {
        let account = rotator.pick(&campaign, &send).await.unwrap().unwrap();
        rotator.record_dispatch(campaign.id, account.id).await.unwrap();
    }

    let mut usage: Vec<i32> = sender_repo
        .links_for_campaign(campaign.id)
        .iter()
        .map(|l| l.times_used)
        .collect();
    usage.sort();
    assert_eq!(usage, vec![2, 2]);
}

#[tokio::test]
async fn test_round_robin_auto_registers_active_accounts() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).build());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(2).with_address("b@corp.com").inactive().build());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(3).with_address("c@corp.com").build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().round_robin(true).build();

    let picked = rotator.pick(&campaign, &send_row(campaign.id, None)).await.unwrap();

    assert!(picked.is_some());
    // 首次选取时惰性注册，非活跃账户不进入名册
    let links = sender_repo.links_for_campaign(campaign.id);
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|l| l.account_id != 2));
}

#[tokio::test]
async fn test_round_robin_without_auto_register_needs_roster() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().round_robin(false).build();

    let picked = rotator.pick(&campaign, &send_row(campaign.id, None)).await.unwrap();
    assert!(picked.is_none());

    sender_repo.register(campaign.id, 1).await.unwrap();
    let picked = rotator.pick(&campaign, &send_row(campaign.id, None)).await.unwrap();
    assert_eq!(picked.unwrap().id, 1);
}

#[tokio::test]
async fn test_round_robin_skips_deactivated_registration() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).with_address("off@corp.com").inactive().build());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(2).with_address("on@corp.com").build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().round_robin(false).build();

    // 名册里的账户可能在注册后被停用
    sender_repo.register(campaign.id, 1).await.unwrap();
    sender_repo.register(campaign.id, 2).await.unwrap();

    let picked = rotator.pick(&campaign, &send_row(campaign.id, None)).await.unwrap();
    assert_eq!(picked.unwrap().id, 2);
}

#[tokio::test]
async fn test_owner_mapped_resolves_by_rep() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).owned_by(7).build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().owner_mapped().build();

    let picked = rotator.pick(&campaign, &send_row(campaign.id, Some(7))).await.unwrap();
    assert_eq!(picked.unwrap().id, 1);
}

#[tokio::test]
async fn test_owner_mapped_ignores_inactive_account() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).owned_by(7).inactive().build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().owner_mapped().build();

    assert!(rotator
        .pick(&campaign, &send_row(campaign.id, Some(7)))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_owner_mapped_without_rep_yields_none() {
    let sender_repo = Arc::new(MockSenderAccountRepository::new());
    sender_repo.add_account(SenderAccountBuilder::new().with_id(1).owned_by(7).build());
    let rotator = SenderRotator::new(sender_repo.clone());
    let campaign = CampaignBuilder::new().owner_mapped().build();

    assert!(rotator
        .pick(&campaign, &send_row(campaign.id, None))
        .await
        .unwrap()
        .is_none());
    assert!(rotator
        .pick(&campaign, &send_row(campaign.id, Some(99)))
        .await
        .unwrap()
        .is_none());
}
