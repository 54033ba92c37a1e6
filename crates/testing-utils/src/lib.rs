//! courier-testing-utils
//!
//! 共享的测试替身: 内存仓储、实体构造器、网关/路由替身。
//! 仅供测试与本地演示使用，不进入生产二进制。

pub mod builders;
pub mod mocks;
pub mod transport;

pub use builders::{
    CampaignBuilder, ContactBuilder, DeferredMessageBuilder, EnrollmentBuilder,
    PlatformUserBuilder, SenderAccountBuilder, StepBuilder,
};
pub use mocks::{
    MockAudienceRepository, MockCampaignRepository, MockDeferredMessageRepository,
    MockSendRepository, MockSenderAccountRepository, MockSequenceRepository, MockThreadRepository,
};
pub use transport::{MockInternalRouter, MockTransportGateway};
