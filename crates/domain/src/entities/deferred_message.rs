use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次性延迟发送: 预先撰写好的消息在指定时间投递
///
/// 与活动无关，走独立的轮询作业。收件人在投递时按内部/外部分流。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredMessage {
    pub id: i64,
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub from_account_id: i64,
    pub due_at: DateTime<Utc>,
    pub status: DeferredStatus,
    pub created_at: DateTime<Utc>,
}

/// 延迟消息状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeferredStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "SENT")]
    Sent,
}
