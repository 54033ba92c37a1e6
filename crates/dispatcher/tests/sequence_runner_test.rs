//! 序列推进器集成测试

use std::sync::Arc;

use chrono::{Duration, Utc};

use courier_dispatcher::SequenceRunner;
use courier_domain::entities::EnrollmentStatus;
use courier_testing_utils::{
    EnrollmentBuilder, MockAudienceRepository, MockSenderAccountRepository, MockSequenceRepository,
    MockThreadRepository, MockTransportGateway, SenderAccountBuilder, StepBuilder,
};

struct RunnerSetup {
    sequence_repo: Arc<MockSequenceRepository>,
    audience_repo: Arc<MockAudienceRepository>,
    thread_repo: Arc<MockThreadRepository>,
    sender_repo: Arc<MockSenderAccountRepository>,
    transport: Arc<MockTransportGateway>,
    runner: SequenceRunner,
}

impl RunnerSetup {
    fn new() -> Self {
        let sequence_repo = Arc::new(MockSequenceRepository::new());
        let audience_repo = Arc::new(MockAudienceRepository::new());
        let thread_repo = Arc::new(MockThreadRepository::new());
        let sender_repo = Arc::new(MockSenderAccountRepository::new());
        let transport = Arc::new(MockTransportGateway::new());
        let runner = SequenceRunner::new(
            sequence_repo.clone(),
            audience_repo.clone(),
            thread_repo.clone(),
            sender_repo.clone(),
            transport.clone(),
        );
        Self {
            sequence_repo,
            audience_repo,
            thread_repo,
            sender_repo,
            transport,
            runner,
        }
    }

    fn with_default_sender(self) -> Self {
        self.sender_repo
            .add_account(SenderAccountBuilder::new().build());
        self
    }
}

#[tokio::test]
async fn test_due_enrollment_sends_step_and_advances() {
    let setup = RunnerSetup::new().with_default_sender();
    setup.sequence_repo.add_step(StepBuilder::new().with_id(1).number(0).build());
    setup.sequence_repo.add_step(
        StepBuilder::new().with_id(2).number(1).with_delay_days(3).build(),
    );
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().at_step(0).build());

    let before = Utc::now();
    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 1);
    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.current_step, 1);
    // 下次到期时间取自下一步的延迟天数
    let next_due = enrollment.next_due_at.unwrap();
    assert!(next_due >= before + Duration::days(3));
    assert!(next_due <= Utc::now() + Duration::days(3));
}

#[tokio::test]
async fn test_last_step_completes_enrollment() {
    let setup = RunnerSetup::new().with_default_sender();
    setup.sequence_repo.add_step(StepBuilder::new().number(0).build());
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().at_step(0).build());

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 1);
    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
}

#[tokio::test]
async fn test_missing_step_completes_without_sending() {
    let setup = RunnerSetup::new().with_default_sender();
    // 步号指向不存在的步骤，按序列走完处理
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().at_step(5).build());

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);
}

#[tokio::test]
async fn test_suppressed_recipient_unsubscribes_without_sending() {
    let setup = RunnerSetup::new().with_default_sender();
    setup.sequence_repo.add_step(StepBuilder::new().number(0).build());
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().with_email("OptOut@Example.com").build());
    setup.audience_repo.suppress("optout@example.com");

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Unsubscribed);
}

#[tokio::test]
async fn test_step_failure_parks_enrollment_in_error() {
    let setup = RunnerSetup::new().with_default_sender();
    setup.sequence_repo.add_step(StepBuilder::new().number(0).build());
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().at_step(0).build());
    setup.transport.fail_for("lead@example.com");

    setup.runner.run_tick().await.unwrap();

    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Error);
    // 步号不动，供诊断后手动恢复
    assert_eq!(enrollment.current_step, 0);
}

#[tokio::test]
async fn test_no_active_sender_parks_enrollment_in_error() {
    let setup = RunnerSetup::new();
    setup.sequence_repo.add_step(StepBuilder::new().number(0).build());
    setup
        .sequence_repo
        .add_enrollment(EnrollmentBuilder::new().build());

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 0);
    let enrollment = setup.sequence_repo.enrollment(1).unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Error);
}

#[tokio::test]
async fn test_same_recipient_and_subject_share_a_thread() {
    let setup = RunnerSetup::new().with_default_sender();
    // 主题模板不含变量，两条注册渲染出同一主题
    setup.sequence_repo.add_step(
        StepBuilder::new().number(0).with_subject("Quarterly check-in").build(),
    );
    setup.sequence_repo.add_enrollment(
        EnrollmentBuilder::new().with_id(1).with_email("lead@example.com").build(),
    );
    setup.sequence_repo.add_enrollment(
        EnrollmentBuilder::new().with_id(2).with_email("lead@example.com").build(),
    );

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.transport.sent_count(), 2);
    assert_eq!(setup.thread_repo.threads().len(), 1);
    let messages = setup.thread_repo.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.confirmation_id.is_some()));
}

#[tokio::test]
async fn test_error_in_one_enrollment_does_not_block_others() {
    let setup = RunnerSetup::new().with_default_sender();
    setup.sequence_repo.add_step(StepBuilder::new().number(0).build());
    setup.sequence_repo.add_enrollment(
        EnrollmentBuilder::new().with_id(1).with_email("bad@example.com").build(),
    );
    setup.sequence_repo.add_enrollment(
        EnrollmentBuilder::new().with_id(2).with_email("good@example.com").build(),
    );
    setup.transport.fail_for("bad@example.com");

    setup.runner.run_tick().await.unwrap();

    assert_eq!(setup.sequence_repo.enrollment(1).unwrap().status, EnrollmentStatus::Error);
    assert_eq!(setup.sequence_repo.enrollment(2).unwrap().status, EnrollmentStatus::Completed);
    assert_eq!(setup.transport.sent_count(), 1);
}
