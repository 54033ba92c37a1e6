use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 可参与轮询的发信账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderAccount {
    pub id: i64,
    pub address: String,
    pub display_name: String,
    pub active: bool,
    /// 固定分配模式下匹配收件人的归属代表
    pub owner_rep_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl SenderAccount {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// 活动与发信账户的注册关系
///
/// times_used是活动内的公平计数器，只在投递确认成功后递增。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSenderLink {
    pub campaign_id: i64,
    pub account_id: i64,
    pub times_used: i32,
    pub registered_at: DateTime<Utc>,
}
