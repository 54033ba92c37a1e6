//! courier-infrastructure
//!
//! 持久化与外部协作方适配器: Postgres仓储、邮件提供方HTTP网关、
//! 内部收件箱路由。

pub mod database;
pub mod inbox_router;
pub mod transport;

pub use database::create_pool;
pub use database::postgres::{
    PostgresAudienceRepository, PostgresCampaignRepository, PostgresDeferredMessageRepository,
    PostgresSendRepository, PostgresSenderAccountRepository, PostgresSequenceRepository,
    PostgresThreadRepository,
};
pub use inbox_router::InboxRouter;
pub use transport::HttpTransportGateway;
