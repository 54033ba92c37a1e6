use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use courier_core::CourierResult;
use courier_domain::entities::{Campaign, CampaignSend, CampaignStatus, RecipientSource};
use courier_domain::repositories::{AudienceRepository, CampaignRepository, SendRepository};
use courier_domain::value_objects::normalize_email;

/// 收件人解析器
///
/// 把活动的筛选配置展开成去重后的投递行，每个活动至多执行一次。
/// 来源按固定顺序处理: 联系人目录 -> 手工名单 -> 平台用户，
/// 同一规范化邮箱以先出现的来源为准，后续来源的重复静默丢弃。
pub struct RecipientResolver {
    audience_repo: Arc<dyn AudienceRepository>,
    send_repo: Arc<dyn SendRepository>,
    campaign_repo: Arc<dyn CampaignRepository>,
}

impl RecipientResolver {
    pub fn new(
        audience_repo: Arc<dyn AudienceRepository>,
        send_repo: Arc<dyn SendRepository>,
        campaign_repo: Arc<dyn CampaignRepository>,
    ) -> Self {
        Self {
            audience_repo,
            send_repo,
            campaign_repo,
        }
    }

    /// 解析活动收件人，返回新建的投递行数
    ///
    /// 幂等闸门: 活动已存在任何投递行时直接跳过。
    /// 所有来源加起来为零收件人时，活动直接置为sent(空活动是无操作的成功)。
    pub async fn resolve(&self, campaign: &Campaign) -> CourierResult<usize> {
        let existing = self.send_repo.count_for_campaign(campaign.id).await?;
        if existing > 0 {
            debug!("活动 {} 已有 {} 条投递行，跳过解析", campaign.id, existing);
            return Ok(0);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut rows: Vec<CampaignSend> = Vec::new();

        if campaign.targeting.include_directory {
            // 目录查询本身已排除do-not-contact和活动排除名单
            let contacts = self
                .audience_repo
                .directory_contacts(campaign.id, &campaign.targeting.directory)
                .await?;
            for contact in contacts {
                push_unique(
                    &mut seen,
                    &mut rows,
                    campaign.id,
                    &contact.email,
                    &contact.name,
                    RecipientSource::Directory,
                    contact.rep_id,
                );
            }
        }

        for manual in &campaign.targeting.manual_recipients {
            let key = normalize_email(&manual.email);
            if key.is_empty() {
                continue;
            }
            if self.audience_repo.is_suppressed(&key).await? {
                debug!("手工名单收件人 {} 在禁发名单中，跳过", key);
                continue;
            }
            push_unique(
                &mut seen,
                &mut rows,
                campaign.id,
                &manual.email,
                &manual.name,
                RecipientSource::Manual,
                None,
            );
        }

        if campaign.targeting.include_platform_users {
            let users = self
                .audience_repo
                .platform_users(&campaign.targeting.platform)
                .await?;
            for user in users {
                let key = normalize_email(&user.email);
                if key.is_empty() {
                    continue;
                }
                if self.audience_repo.is_suppressed(&key).await? {
                    debug!("平台用户 {} 在禁发名单中，跳过", key);
                    continue;
                }
                push_unique(
                    &mut seen,
                    &mut rows,
                    campaign.id,
                    &user.email,
                    &user.name,
                    RecipientSource::Platform,
                    None,
                );
            }
        }

        if rows.is_empty() {
            info!("活动 {} 未解析到任何收件人，直接结项为sent", campaign.id);
            self.campaign_repo
                .update_status(campaign.id, CampaignStatus::Sent)
                .await?;
            return Ok(0);
        }

        let created = self.send_repo.create_batch(&rows).await?;
        info!("活动 {} 解析出 {} 个收件人", campaign.id, created);

        Ok(created)
    }
}

/// 以规范化邮箱为去重键追加投递行，空邮箱跳过
fn push_unique(
    seen: &mut HashSet<String>,
    rows: &mut Vec<CampaignSend>,
    campaign_id: i64,
    email: &str,
    name: &str,
    source: RecipientSource,
    rep_id: Option<i64>,
) -> bool {
    let key = normalize_email(email);
    if key.is_empty() {
        return false;
    }
    if !seen.insert(key.clone()) {
        return false;
    }
    rows.push(CampaignSend::new(
        campaign_id,
        key,
        name.to_string(),
        source,
        rep_id,
    ));
    true
}
