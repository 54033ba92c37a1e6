pub mod postgres;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use courier_core::config::DatabaseConfig;
use courier_core::CourierResult;

/// 按配置建立Postgres连接池
pub async fn create_pool(config: &DatabaseConfig) -> CourierResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await?;
    Ok(pool)
}
