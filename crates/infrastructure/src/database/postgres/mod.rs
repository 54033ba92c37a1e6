mod postgres_audience_repository;
mod postgres_campaign_repository;
mod postgres_deferred_message_repository;
mod postgres_send_repository;
mod postgres_sender_account_repository;
mod postgres_sequence_repository;
mod postgres_thread_repository;

pub use postgres_audience_repository::PostgresAudienceRepository;
pub use postgres_campaign_repository::PostgresCampaignRepository;
pub use postgres_deferred_message_repository::PostgresDeferredMessageRepository;
pub use postgres_send_repository::PostgresSendRepository;
pub use postgres_sender_account_repository::PostgresSenderAccountRepository;
pub use postgres_sequence_repository::PostgresSequenceRepository;
pub use postgres_thread_repository::PostgresThreadRepository;
