use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个收件人的投递行
///
/// 每个(活动, 收件人)对恰好一行，由收件人解析器创建，去重键为规范化邮箱。
/// 终态(sent/failed/bounced)不再回到pending。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSend {
    pub id: i64,
    pub campaign_id: i64,
    pub email: String,
    pub name: String,
    pub source: RecipientSource,
    /// 收件人归属的销售代表，固定分配模式下用于选取发信账户
    pub rep_id: Option<i64>,
    pub status: SendStatus,
    /// 计划发送时间，时间规划器运行前为空
    pub due_at: Option<DateTime<Utc>>,
    pub sender_account_id: Option<i64>,
    /// 投递网关返回的确认ID
    pub confirmation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CampaignSend {
    pub fn new(
        campaign_id: i64,
        email: String,
        name: String,
        source: RecipientSource,
        rep_id: Option<i64>,
    ) -> Self {
        Self {
            id: 0,
            campaign_id,
            email,
            name,
            source,
            rep_id,
            status: SendStatus::Pending,
            due_at: None,
            sender_account_id: None,
            confirmation_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SendStatus::Pending
    }

    /// 模板变量: name / first_name / email
    pub fn template_vars(&self) -> HashMap<String, String> {
        let first_name = self
            .name
            .split_whitespace()
            .next()
            .unwrap_or(self.name.as_str())
            .to_string();

        HashMap::from([
            ("name".to_string(), self.name.clone()),
            ("first_name".to_string(), first_name),
            ("email".to_string(), self.email.clone()),
        ])
    }
}

/// 收件人来源，去重时按此固定顺序处理
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecipientSource {
    #[serde(rename = "DIRECTORY")]
    Directory,
    #[serde(rename = "MANUAL")]
    Manual,
    #[serde(rename = "PLATFORM")]
    Platform,
}

/// 投递行状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SendStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "SENT")]
    Sent,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "BOUNCED")]
    Bounced,
}

impl SendStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SendStatus::Pending)
    }
}
