use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use courier_core::CourierResult;
use courier_domain::entities::{SequenceEnrollment, SequenceStep};
use courier_domain::repositories::SequenceRepository;

pub struct PostgresSequenceRepository {
    pool: PgPool,
}

impl PostgresSequenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_enrollment(row: &sqlx::postgres::PgRow) -> CourierResult<SequenceEnrollment> {
        Ok(SequenceEnrollment {
            id: row.try_get("id")?,
            sequence_id: row.try_get("sequence_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            current_step: row.try_get("current_step")?,
            next_due_at: row.try_get("next_due_at")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_step(row: &sqlx::postgres::PgRow) -> CourierResult<SequenceStep> {
        Ok(SequenceStep {
            id: row.try_get("id")?,
            sequence_id: row.try_get("sequence_id")?,
            step_number: row.try_get("step_number")?,
            subject_template: row.try_get("subject_template")?,
            body_template: row.try_get("body_template")?,
            delay_days: row.try_get("delay_days")?,
        })
    }
}

#[async_trait]
impl SequenceRepository for PostgresSequenceRepository {
    async fn find_due_enrollments(
        &self,
        now: DateTime<Utc>,
    ) -> CourierResult<Vec<SequenceEnrollment>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sequence_enrollments
            WHERE status = 'ACTIVE' AND next_due_at IS NOT NULL AND next_due_at <= $1
            ORDER BY next_due_at ASC, id ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_enrollment).collect()
    }

    async fn update_enrollment(&self, enrollment: &SequenceEnrollment) -> CourierResult<()> {
        sqlx::query(
            r#"
            UPDATE sequence_enrollments
            SET current_step = $2, next_due_at = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(enrollment.id)
        .bind(enrollment.current_step)
        .bind(enrollment.next_due_at)
        .bind(enrollment.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_step(
        &self,
        sequence_id: i64,
        step_number: i32,
    ) -> CourierResult<Option<SequenceStep>> {
        let row = sqlx::query(
            "SELECT * FROM sequence_steps WHERE sequence_id = $1 AND step_number = $2",
        )
        .bind(sequence_id)
        .bind(step_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_step(&r)).transpose()
    }
}
