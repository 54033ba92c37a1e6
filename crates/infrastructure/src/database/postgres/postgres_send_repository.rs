use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use courier_core::CourierResult;
use courier_domain::entities::{CampaignSend, SendStatus};
use courier_domain::repositories::{SendRepository, SendRollup};

pub struct PostgresSendRepository {
    pool: PgPool,
}

impl PostgresSendRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_send(row: &sqlx::postgres::PgRow) -> CourierResult<CampaignSend> {
        Ok(CampaignSend {
            id: row.try_get("id")?,
            campaign_id: row.try_get("campaign_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            source: row.try_get("source")?,
            rep_id: row.try_get("rep_id")?,
            status: row.try_get("status")?,
            due_at: row.try_get("due_at")?,
            sender_account_id: row.try_get("sender_account_id")?,
            confirmation_id: row.try_get("confirmation_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SendRepository for PostgresSendRepository {
    async fn create_batch(&self, sends: &[CampaignSend]) -> CourierResult<usize> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;
        for send in sends {
            // 唯一索引(campaign_id, email)是去重键的最后防线
            let result = sqlx::query(
                r#"
                INSERT INTO campaign_sends
                    (campaign_id, email, name, source, rep_id, status, created_at)
                VALUES ($1, $2, $3, $4, $5, 'PENDING', NOW())
                ON CONFLICT (campaign_id, email) DO NOTHING
                "#,
            )
            .bind(send.campaign_id)
            .bind(&send.email)
            .bind(&send.name)
            .bind(send.source)
            .bind(send.rep_id)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn count_for_campaign(&self, campaign_id: i64) -> CourierResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM campaign_sends WHERE campaign_id = $1")
            .bind(campaign_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    async fn find_unplanned(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSend>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM campaign_sends
            WHERE campaign_id = $1 AND status = 'PENDING' AND due_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_send).collect()
    }

    async fn set_due_at(&self, send_id: i64, due_at: DateTime<Utc>) -> CourierResult<()> {
        sqlx::query("UPDATE campaign_sends SET due_at = $2 WHERE id = $1")
            .bind(send_id)
            .bind(due_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_due_batch(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
        limit: i64,
    ) -> CourierResult<Vec<CampaignSend>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM campaign_sends
            WHERE campaign_id = $1
              AND status = 'PENDING'
              AND (due_at IS NULL OR due_at <= $2)
            ORDER BY due_at ASC NULLS FIRST, id ASC
            LIMIT $3
            "#,
        )
        .bind(campaign_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_send).collect()
    }

    async fn count_pending_future(
        &self,
        campaign_id: i64,
        now: DateTime<Utc>,
    ) -> CourierResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM campaign_sends
            WHERE campaign_id = $1 AND status = 'PENDING' AND due_at > $2
            "#,
        )
        .bind(campaign_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("count")?)
    }

    async fn mark_sent(
        &self,
        send_id: i64,
        sender_account_id: i64,
        confirmation_id: &str,
    ) -> CourierResult<()> {
        // 条件更新同时充当行级claim: 并发tick下只有一个写入者能命中PENDING行，
        // 终态行不会被改回
        sqlx::query(
            r#"
            UPDATE campaign_sends
            SET status = 'SENT', sender_account_id = $2, confirmation_id = $3
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(send_id)
        .bind(sender_account_id)
        .bind(confirmation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, send_id: i64) -> CourierResult<()> {
        sqlx::query(
            "UPDATE campaign_sends SET status = 'FAILED' WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(send_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(&self, send_id: i64, status: SendStatus) -> CourierResult<()> {
        sqlx::query("UPDATE campaign_sends SET status = $2 WHERE id = $1")
            .bind(send_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn status_rollup(&self, campaign_id: i64) -> CourierResult<SendRollup> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM campaign_sends
            WHERE campaign_id = $1
            GROUP BY status
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        let mut rollup = SendRollup::default();
        for row in rows {
            let status: SendStatus = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            match status {
                SendStatus::Pending => rollup.pending = count,
                SendStatus::Sent => rollup.sent = count,
                SendStatus::Failed => rollup.failed = count,
                SendStatus::Bounced => rollup.bounced = count,
            }
        }
        Ok(rollup)
    }
}
