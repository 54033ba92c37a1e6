use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 序列注册: 单个收件人在多步滴灌序列中的进度
///
/// 由外部创建，仅序列推进器修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEnrollment {
    pub id: i64,
    pub sequence_id: i64,
    pub email: String,
    pub name: String,
    pub current_step: i32,
    /// 下一步到期时间，序列结束后为空
    pub next_due_at: Option<DateTime<Utc>>,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SequenceEnrollment {
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    /// 收件人模板变量: name / first_name / email
    pub fn template_vars(&self) -> std::collections::HashMap<String, String> {
        let first_name = self
            .name
            .split_whitespace()
            .next()
            .unwrap_or(self.name.as_str())
            .to_string();

        std::collections::HashMap::from([
            ("name".to_string(), self.name.clone()),
            ("first_name".to_string(), first_name),
            ("email".to_string(), self.email.clone()),
        ])
    }
}

/// 序列注册状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnrollmentStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "UNSUBSCRIBED")]
    Unsubscribed,
    /// 步骤执行异常，current_step保持不变供人工诊断后恢复
    #[serde(rename = "ERROR")]
    Error,
}

/// 序列步骤，按step_number排序且不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceStep {
    pub id: i64,
    pub sequence_id: i64,
    pub step_number: i32,
    pub subject_template: String,
    pub body_template: String,
    /// 推进到下一步前的等待天数
    pub delay_days: i64,
}
