//! 测试实体构造器

use chrono::{DateTime, Duration, NaiveTime, Utc};

use courier_domain::entities::{
    Campaign, CampaignStats, CampaignStatus, Contact, DeferredMessage, DeferredStatus,
    DirectoryFilter, EnrollmentStatus, ManualRecipient, PlatformFilter, PlatformUser, SendWindow,
    SenderAccount, SenderMode, SequenceEnrollment, SequenceStep, TargetingConfig, TimingConfig,
    TimingStrategy,
};

pub struct CampaignBuilder {
    campaign: Campaign,
}

impl CampaignBuilder {
    pub fn new() -> Self {
        Self {
            campaign: Campaign {
                id: 1,
                name: "test_campaign".to_string(),
                status: CampaignStatus::Sending,
                subject_template: "Hello {{first_name}}".to_string(),
                body_template: "Hi {{name}}, this is a test.".to_string(),
                targeting: TargetingConfig::default(),
                timing: TimingConfig::default(),
                sender_mode: SenderMode::RoundRobin { all_active: true },
                scheduled_at: None,
                stats: CampaignStats::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.campaign.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.campaign.name = name.to_string();
        self
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.campaign.status = status;
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.campaign.subject_template = subject.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.campaign.body_template = body.to_string();
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.campaign.scheduled_at = Some(at);
        self
    }

    pub fn immediate(mut self) -> Self {
        self.campaign.timing.strategy = TimingStrategy::Immediate;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.campaign.timing.strategy = TimingStrategy::Fixed;
        self
    }

    pub fn staggered(mut self, interval_minutes: i64) -> Self {
        self.campaign.timing.strategy = TimingStrategy::Staggered;
        self.campaign.timing.stagger_interval_minutes = interval_minutes;
        self
    }

    pub fn drip(mut self, min_minutes: i64, max_minutes: i64) -> Self {
        self.campaign.timing.strategy = TimingStrategy::Drip;
        self.campaign.timing.drip_min_minutes = min_minutes;
        self.campaign.timing.drip_max_minutes = max_minutes;
        self
    }

    pub fn with_window(mut self, start: &str, end: &str) -> Self {
        self.campaign.timing.send_window = Some(SendWindow {
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        });
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.campaign.timing.batch_size = batch_size;
        self
    }

    pub fn with_send_delay(mut self, seconds: u64) -> Self {
        self.campaign.timing.send_delay_seconds = seconds;
        self
    }

    pub fn owner_mapped(mut self) -> Self {
        self.campaign.sender_mode = SenderMode::OwnerMapped;
        self
    }

    pub fn round_robin(mut self, all_active: bool) -> Self {
        self.campaign.sender_mode = SenderMode::RoundRobin { all_active };
        self
    }

    pub fn include_directory(mut self) -> Self {
        self.campaign.targeting.include_directory = true;
        self
    }

    pub fn with_directory_filter(mut self, filter: DirectoryFilter) -> Self {
        self.campaign.targeting.include_directory = true;
        self.campaign.targeting.directory = filter;
        self
    }

    pub fn with_manual(mut self, email: &str, name: &str) -> Self {
        self.campaign.targeting.manual_recipients.push(ManualRecipient {
            email: email.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn include_platform_users(mut self) -> Self {
        self.campaign.targeting.include_platform_users = true;
        self
    }

    pub fn with_platform_filter(mut self, filter: PlatformFilter) -> Self {
        self.campaign.targeting.include_platform_users = true;
        self.campaign.targeting.platform = filter;
        self
    }

    pub fn build(self) -> Campaign {
        self.campaign
    }
}

impl Default for CampaignBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SenderAccountBuilder {
    account: SenderAccount,
}

impl SenderAccountBuilder {
    pub fn new() -> Self {
        Self {
            account: SenderAccount {
                id: 1,
                address: "sender@example.com".to_string(),
                display_name: "Test Sender".to_string(),
                active: true,
                owner_rep_id: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.account.id = id;
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.account.address = address.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.account.active = false;
        self
    }

    pub fn owned_by(mut self, rep_id: i64) -> Self {
        self.account.owner_rep_id = Some(rep_id);
        self
    }

    pub fn build(self) -> SenderAccount {
        self.account
    }
}

impl Default for SenderAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContactBuilder {
    contact: Contact,
}

impl ContactBuilder {
    pub fn new() -> Self {
        Self {
            contact: Contact {
                id: 1,
                email: "contact@example.com".to_string(),
                name: "Test Contact".to_string(),
                tags: Vec::new(),
                temperature: None,
                do_not_contact: false,
                rep_id: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.contact.id = id;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.contact.email = email.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.contact.name = name.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.contact.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_temperature(mut self, temperature: &str) -> Self {
        self.contact.temperature = Some(temperature.to_string());
        self
    }

    pub fn do_not_contact(mut self) -> Self {
        self.contact.do_not_contact = true;
        self
    }

    pub fn owned_by(mut self, rep_id: i64) -> Self {
        self.contact.rep_id = Some(rep_id);
        self
    }

    pub fn build(self) -> Contact {
        self.contact
    }
}

impl Default for ContactBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PlatformUserBuilder {
    user: PlatformUser,
}

impl PlatformUserBuilder {
    pub fn new() -> Self {
        Self {
            user: PlatformUser {
                id: 1,
                email: "user@example.com".to_string(),
                name: "Test User".to_string(),
                is_rep: false,
                tier: None,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.user.id = id;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.user.email = email.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.user.name = name.to_string();
        self
    }

    pub fn rep(mut self) -> Self {
        self.user.is_rep = true;
        self
    }

    pub fn with_tier(mut self, tier: &str) -> Self {
        self.user.tier = Some(tier.to_string());
        self
    }

    pub fn build(self) -> PlatformUser {
        self.user
    }
}

impl Default for PlatformUserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EnrollmentBuilder {
    enrollment: SequenceEnrollment,
}

impl EnrollmentBuilder {
    pub fn new() -> Self {
        Self {
            enrollment: SequenceEnrollment {
                id: 1,
                sequence_id: 1,
                email: "lead@example.com".to_string(),
                name: "Test Lead".to_string(),
                current_step: 0,
                next_due_at: Some(Utc::now() - Duration::minutes(1)),
                status: EnrollmentStatus::Active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.enrollment.id = id;
        self
    }

    pub fn with_sequence(mut self, sequence_id: i64) -> Self {
        self.enrollment.sequence_id = sequence_id;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.enrollment.email = email.to_string();
        self
    }

    pub fn at_step(mut self, step: i32) -> Self {
        self.enrollment.current_step = step;
        self
    }

    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.enrollment.next_due_at = Some(at);
        self
    }

    pub fn with_status(mut self, status: EnrollmentStatus) -> Self {
        self.enrollment.status = status;
        self
    }

    pub fn build(self) -> SequenceEnrollment {
        self.enrollment
    }
}

impl Default for EnrollmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StepBuilder {
    step: SequenceStep,
}

impl StepBuilder {
    pub fn new() -> Self {
        Self {
            step: SequenceStep {
                id: 1,
                sequence_id: 1,
                step_number: 0,
                subject_template: "Step subject {{first_name}}".to_string(),
                body_template: "Step body for {{name}}".to_string(),
                delay_days: 2,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.step.id = id;
        self
    }

    pub fn with_sequence(mut self, sequence_id: i64) -> Self {
        self.step.sequence_id = sequence_id;
        self
    }

    pub fn number(mut self, step_number: i32) -> Self {
        self.step.step_number = step_number;
        self
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.step.subject_template = subject.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.step.body_template = body.to_string();
        self
    }

    pub fn with_delay_days(mut self, days: i64) -> Self {
        self.step.delay_days = days;
        self
    }

    pub fn build(self) -> SequenceStep {
        self.step
    }
}

impl Default for StepBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DeferredMessageBuilder {
    message: DeferredMessage,
}

impl DeferredMessageBuilder {
    pub fn new() -> Self {
        Self {
            message: DeferredMessage {
                id: 1,
                subject: "Deferred subject".to_string(),
                body: "Deferred body".to_string(),
                recipients: Vec::new(),
                from_account_id: 1,
                due_at: Utc::now() - Duration::minutes(1),
                status: DeferredStatus::Pending,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.message.id = id;
        self
    }

    pub fn with_recipients(mut self, recipients: &[&str]) -> Self {
        self.message.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn from_account(mut self, account_id: i64) -> Self {
        self.message.from_account_id = account_id;
        self
    }

    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.message.due_at = at;
        self
    }

    pub fn build(self) -> DeferredMessage {
        self.message
    }
}

impl Default for DeferredMessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
