use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_core::CourierResult;
use courier_domain::entities::Thread;
use courier_domain::repositories::ThreadRepository;
use courier_domain::value_objects::normalize_email;

pub struct PostgresThreadRepository {
    pool: PgPool,
}

impl PostgresThreadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_thread(row: &sqlx::postgres::PgRow) -> CourierResult<Thread> {
        Ok(Thread {
            id: row.try_get("id")?,
            recipient_email: row.try_get("recipient_email")?,
            subject: row.try_get("subject")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ThreadRepository for PostgresThreadRepository {
    async fn find_or_create(&self, recipient_email: &str, subject: &str) -> CourierResult<Thread> {
        let key = normalize_email(recipient_email);

        // upsert后总能RETURNING到行，(recipient_email, subject)唯一
        let row = sqlx::query(
            r#"
            INSERT INTO threads (recipient_email, subject, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (recipient_email, subject)
            DO UPDATE SET recipient_email = EXCLUDED.recipient_email
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(subject)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_thread(&row)
    }

    async fn record_message(
        &self,
        thread_id: i64,
        from_address: &str,
        body: &str,
        confirmation_id: Option<&str>,
    ) -> CourierResult<()> {
        sqlx::query(
            r#"
            INSERT INTO thread_messages (thread_id, from_address, body, confirmation_id, sent_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(thread_id)
        .bind(from_address)
        .bind(body)
        .bind(confirmation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
