use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use courier_core::{CourierError, CourierResult};

/// 营销活动
///
/// 表示一次批量发送意图，包含收件人筛选、模板、发送节奏和发信账户分配策略。
/// 状态只由生命周期组件和分发器推进: draft -> scheduled -> sending -> sent。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub status: CampaignStatus,
    pub subject_template: String,
    pub body_template: String,
    pub targeting: TargetingConfig,
    pub timing: TimingConfig,
    pub sender_mode: SenderMode,
    /// 定时发送时间，scheduled状态下到达即提升为sending
    pub scheduled_at: Option<DateTime<Utc>>,
    pub stats: CampaignStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_sending(&self) -> bool {
        self.status == CampaignStatus::Sending
    }

    /// 校验活动配置，在创建时调用而不是分发时
    ///
    /// 收件人筛选问题归为Targeting错误，节奏问题归为Configuration错误。
    pub fn validate(&self) -> CourierResult<()> {
        self.targeting
            .validate()
            .map_err(|e| CourierError::Targeting(e.to_string()))?;
        self.timing
            .validate()
            .map_err(|e| CourierError::Configuration(e.to_string()))?;
        Ok(())
    }
}

/// 营销活动状态
///
/// 没有failed状态: 行级失败记录在投递行上，活动最终总会到达sent。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CampaignStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "SENDING")]
    Sending,
    #[serde(rename = "SENT")]
    Sent,
}

/// 活动汇总统计，结项时从投递行重新计算
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CampaignStats {
    pub total_sent: i64,
    pub total_failed: i64,
    pub total_bounced: i64,
}

/// 收件人筛选配置
///
/// 三个来源独立开关，解析时按固定顺序处理: 联系人目录 -> 手工名单 -> 平台用户。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetingConfig {
    pub include_directory: bool,
    pub directory: DirectoryFilter,
    pub manual_recipients: Vec<ManualRecipient>,
    pub include_platform_users: bool,
    pub platform: PlatformFilter,
}

impl TargetingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.include_directory
            && self.manual_recipients.is_empty()
            && !self.include_platform_users
        {
            return Err(anyhow::anyhow!("至少需要启用一个收件人来源"));
        }

        for recipient in &self.manual_recipients {
            if !recipient.email.trim().is_empty() && !recipient.email.contains('@') {
                return Err(anyhow::anyhow!("手工名单邮箱格式无效: {}", recipient.email));
            }
        }

        Ok(())
    }
}

/// 联系人目录筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFilter {
    pub tags: Vec<String>,
    pub temperature: Option<String>,
}

/// 手工提供的收件人
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualRecipient {
    pub email: String,
    pub name: String,
}

/// 平台用户筛选条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformFilter {
    pub reps_only: bool,
    pub tiers: Vec<String>,
}

/// 发送节奏配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub strategy: TimingStrategy,
    /// 每个tick最多处理的投递行数
    pub batch_size: i64,
    /// blast模式下批内行间的限速延迟，其他策略不使用
    pub send_delay_seconds: u64,
    pub stagger_interval_minutes: i64,
    pub drip_min_minutes: i64,
    pub drip_max_minutes: i64,
    pub send_window: Option<SendWindow>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            strategy: TimingStrategy::Immediate,
            batch_size: 100,
            send_delay_seconds: 0,
            stagger_interval_minutes: 5,
            drip_min_minutes: 3,
            drip_max_minutes: 8,
            send_window: None,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size <= 0 {
            return Err(anyhow::anyhow!("批次大小必须大于0"));
        }

        match self.strategy {
            TimingStrategy::Staggered => {
                if self.stagger_interval_minutes <= 0 {
                    return Err(anyhow::anyhow!("均匀间隔必须大于0分钟"));
                }
            }
            TimingStrategy::Drip => {
                if self.drip_min_minutes <= 0 || self.drip_max_minutes <= 0 {
                    return Err(anyhow::anyhow!("滴灌间隔上下界必须大于0分钟"));
                }
            }
            TimingStrategy::Immediate | TimingStrategy::Fixed => {}
        }

        if let Some(window) = &self.send_window {
            window.validate()?;
        }

        Ok(())
    }
}

/// 发送时间策略，四种互斥
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimingStrategy {
    /// 全部立即可发(blast)
    #[serde(rename = "IMMEDIATE")]
    Immediate,
    /// 全部使用外部给定的统一时间
    #[serde(rename = "FIXED")]
    Fixed,
    /// 按创建顺序等间隔错开
    #[serde(rename = "STAGGERED")]
    Staggered,
    /// 按创建顺序随机间隔滴灌
    #[serde(rename = "DRIP")]
    Drip,
}

/// 允许发送的时间窗口
///
/// start > end 表示跨夜窗口(如 22:00-06:00)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SendWindow {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.start == self.end {
            return Err(anyhow::anyhow!("发送窗口起止时间不能相同"));
        }
        Ok(())
    }
}

/// 发信账户分配策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode")]
pub enum SenderMode {
    /// 按收件人归属的销售代表固定分配
    #[serde(rename = "OWNER_MAPPED")]
    OwnerMapped,
    /// 公平轮询; all_active时首次选取前自动注册所有活跃账户
    #[serde(rename = "ROUND_ROBIN")]
    RoundRobin { all_active: bool },
}
