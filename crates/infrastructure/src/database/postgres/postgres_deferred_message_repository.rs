use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use courier_core::{CourierError, CourierResult};
use courier_domain::entities::DeferredMessage;
use courier_domain::repositories::DeferredMessageRepository;

pub struct PostgresDeferredMessageRepository {
    pool: PgPool,
}

impl PostgresDeferredMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_message(row: &sqlx::postgres::PgRow) -> CourierResult<DeferredMessage> {
        let recipients = serde_json::from_value(row.try_get("recipients")?)
            .map_err(|e| CourierError::Serialization(format!("recipients反序列化失败: {e}")))?;

        Ok(DeferredMessage {
            id: row.try_get("id")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            recipients,
            from_account_id: row.try_get("from_account_id")?,
            due_at: row.try_get("due_at")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl DeferredMessageRepository for PostgresDeferredMessageRepository {
    async fn find_due(&self, now: DateTime<Utc>) -> CourierResult<Vec<DeferredMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM deferred_messages
            WHERE status = 'PENDING' AND due_at <= $1
            ORDER BY due_at ASC, id ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn mark_sent(&self, id: i64) -> CourierResult<()> {
        sqlx::query(
            "UPDATE deferred_messages SET status = 'SENT' WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
