use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, error, info};

use courier_core::{template, CourierError, CourierResult};
use courier_domain::entities::{EnrollmentStatus, SequenceEnrollment};
use courier_domain::ports::{OutboundEmail, TransportGateway};
use courier_domain::repositories::{
    AudienceRepository, SenderAccountRepository, SequenceRepository, ThreadRepository,
};
use courier_domain::value_objects::normalize_email;

/// 单次推进的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 收件人已全局退订，未发送任何消息
    Unsubscribed,
    /// 序列走完
    Completed,
    /// 本步已发出并推进到下一步
    Advanced,
}

/// 序列推进器
///
/// 对每条到期的active注册: 先做全局退订检查，再定位当前步骤、
/// 渲染并经会话线程发出，最后推进步号或完结。步骤内任何异常把注册
/// 置为error且不动current_step，供操作员诊断后手动恢复。
pub struct SequenceRunner {
    sequence_repo: Arc<dyn SequenceRepository>,
    audience_repo: Arc<dyn AudienceRepository>,
    thread_repo: Arc<dyn ThreadRepository>,
    sender_repo: Arc<dyn SenderAccountRepository>,
    transport: Arc<dyn TransportGateway>,
}

impl SequenceRunner {
    pub fn new(
        sequence_repo: Arc<dyn SequenceRepository>,
        audience_repo: Arc<dyn AudienceRepository>,
        thread_repo: Arc<dyn ThreadRepository>,
        sender_repo: Arc<dyn SenderAccountRepository>,
        transport: Arc<dyn TransportGateway>,
    ) -> Self {
        Self {
            sequence_repo,
            audience_repo,
            thread_repo,
            sender_repo,
            transport,
        }
    }

    pub async fn run_tick(&self) -> CourierResult<()> {
        let due = self.sequence_repo.find_due_enrollments(Utc::now()).await?;
        if due.is_empty() {
            return Ok(());
        }
        debug!("本次tick共有 {} 条到期序列注册", due.len());

        for enrollment in due {
            match self.advance(&enrollment).await {
                Ok(outcome) => {
                    debug!("序列注册 {} 推进结果: {:?}", enrollment.id, outcome);
                }
                Err(e) => {
                    error!("序列注册 {} 步骤执行异常: {}", enrollment.id, e);
                    // current_step保持不变，供诊断后手动恢复
                    let mut errored = enrollment.clone();
                    errored.status = EnrollmentStatus::Error;
                    errored.updated_at = Utc::now();
                    if let Err(persist_err) =
                        self.sequence_repo.update_enrollment(&errored).await
                    {
                        error!(
                            "序列注册 {} 写入error状态失败: {}",
                            enrollment.id, persist_err
                        );
                    }
                }
            }
        }

        Ok(())
    }

    async fn advance(&self, enrollment: &SequenceEnrollment) -> CourierResult<StepOutcome> {
        if self
            .audience_repo
            .is_suppressed(&normalize_email(&enrollment.email))
            .await?
        {
            self.transition(enrollment, EnrollmentStatus::Unsubscribed, None)
                .await?;
            info!("序列注册 {} 收件人已全局退订", enrollment.id);
            return Ok(StepOutcome::Unsubscribed);
        }

        let step = self
            .sequence_repo
            .find_step(enrollment.sequence_id, enrollment.current_step)
            .await?;
        let Some(step) = step else {
            self.transition(enrollment, EnrollmentStatus::Completed, None)
                .await?;
            return Ok(StepOutcome::Completed);
        };

        let vars = enrollment.template_vars();
        let subject = template::render(&step.subject_template, &vars)?;
        let body = template::render(&step.body_template, &vars)?;

        let from = self
            .sender_repo
            .find_active()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CourierError::Configuration("没有活跃发信账户可用于序列发送".to_string())
            })?;

        // 会话线程按(收件人, 主题)复用
        let thread = self
            .thread_repo
            .find_or_create(&enrollment.email, &subject)
            .await?;

        let email = OutboundEmail::new(
            from.address.clone(),
            vec![enrollment.email.clone()],
            subject,
            body.clone(),
        );
        let confirmation_id = self.transport.send(&email).await?;

        self.thread_repo
            .record_message(thread.id, &from.address, &body, Some(&confirmation_id))
            .await?;

        let next_step = self
            .sequence_repo
            .find_step(enrollment.sequence_id, enrollment.current_step + 1)
            .await?;

        match next_step {
            Some(next) => {
                let mut advanced = enrollment.clone();
                advanced.current_step += 1;
                advanced.next_due_at = Some(Utc::now() + Duration::days(next.delay_days));
                advanced.updated_at = Utc::now();
                self.sequence_repo.update_enrollment(&advanced).await?;
                Ok(StepOutcome::Advanced)
            }
            None => {
                self.transition(enrollment, EnrollmentStatus::Completed, None)
                    .await?;
                Ok(StepOutcome::Completed)
            }
        }
    }

    async fn transition(
        &self,
        enrollment: &SequenceEnrollment,
        status: EnrollmentStatus,
        next_due_at: Option<chrono::DateTime<Utc>>,
    ) -> CourierResult<()> {
        let mut updated = enrollment.clone();
        updated.status = status;
        updated.next_due_at = next_due_at;
        updated.updated_at = Utc::now();
        self.sequence_repo.update_enrollment(&updated).await
    }
}

#[async_trait]
impl crate::jobs::Job for SequenceRunner {
    fn name(&self) -> &'static str {
        "sequence-advance"
    }

    async fn run(&self) -> CourierResult<()> {
        self.run_tick().await
    }
}
