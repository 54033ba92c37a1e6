use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会话线程，按(收件人邮箱, 主题)复用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub recipient_email: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// 线程内记录的一条出站消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: i64,
    pub thread_id: i64,
    pub from_address: String,
    pub body: String,
    pub confirmation_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}
