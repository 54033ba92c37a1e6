use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 联系人目录条目(只读来源)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub tags: Vec<String>,
    pub temperature: Option<String>,
    pub do_not_contact: bool,
    /// 归属的销售代表
    pub rep_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 平台用户目录条目(只读来源)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_rep: bool,
    pub tier: Option<String>,
}
