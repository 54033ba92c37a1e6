//! courier-dispatcher
//!
//! 出站消息投递调度核心: 收件人解析、发送时间规划、发信账户轮询、
//! 批次分发、一次性延迟发送与序列推进。全部组件无tick间内存状态，
//! 持久化存储是唯一事实来源。

pub mod campaign_lifecycle;
pub mod deferred_send;
pub mod dispatch_worker;
pub mod jobs;
pub mod recipient_resolver;
pub mod sender_rotator;
pub mod sequence_runner;
pub mod timing_planner;

pub use campaign_lifecycle::CampaignLifecycle;
pub use deferred_send::DeferredSendJob;
pub use dispatch_worker::{DispatchWorker, RowError, RowErrorKind, RowOutcome};
pub use jobs::{Job, JobRegistry};
pub use recipient_resolver::RecipientResolver;
pub use sender_rotator::SenderRotator;
pub use sequence_runner::{SequenceRunner, StepOutcome};
pub use timing_planner::{clamp_to_window, TimingPlanner};
