use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_core::{CourierError, CourierResult};
use courier_domain::entities::{Campaign, CampaignStats, CampaignStatus};
use courier_domain::repositories::CampaignRepository;

pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_campaign(row: &sqlx::postgres::PgRow) -> CourierResult<Campaign> {
        let targeting = serde_json::from_value(row.try_get("targeting")?)
            .map_err(|e| CourierError::Serialization(format!("targeting反序列化失败: {e}")))?;
        let timing = serde_json::from_value(row.try_get("timing")?)
            .map_err(|e| CourierError::Serialization(format!("timing反序列化失败: {e}")))?;
        let sender_mode = serde_json::from_value(row.try_get("sender_mode")?)
            .map_err(|e| CourierError::Serialization(format!("sender_mode反序列化失败: {e}")))?;

        Ok(Campaign {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            status: row.try_get("status")?,
            subject_template: row.try_get("subject_template")?,
            body_template: row.try_get("body_template")?,
            targeting,
            timing,
            sender_mode,
            scheduled_at: row.try_get("scheduled_at")?,
            stats: CampaignStats {
                total_sent: row.try_get("total_sent")?,
                total_failed: row.try_get("total_failed")?,
                total_bounced: row.try_get("total_bounced")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> CourierResult<Campaign> {
        campaign.validate()?;

        let targeting = serde_json::to_value(&campaign.targeting)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;
        let timing = serde_json::to_value(&campaign.timing)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;
        let sender_mode = serde_json::to_value(&campaign.sender_mode)
            .map_err(|e| CourierError::Serialization(e.to_string()))?;

        let row = sqlx::query(
            r#"
            INSERT INTO campaigns
                (name, status, subject_template, body_template, targeting, timing,
                 sender_mode, scheduled_at, total_sent, total_failed, total_bounced,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, 0, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(&campaign.name)
        .bind(campaign.status)
        .bind(&campaign.subject_template)
        .bind(&campaign.body_template)
        .bind(targeting)
        .bind(timing)
        .bind(sender_mode)
        .bind(campaign.scheduled_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_campaign(&row)
    }

    async fn get_by_id(&self, id: i64) -> CourierResult<Option<Campaign>> {
        let row = sqlx::query("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_campaign(&r)).transpose()
    }

    async fn find_by_status(&self, status: CampaignStatus) -> CourierResult<Vec<Campaign>> {
        let rows = sqlx::query("SELECT * FROM campaigns WHERE status = $1 ORDER BY id")
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_campaign).collect()
    }

    async fn find_due_scheduled(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> CourierResult<Vec<Campaign>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM campaigns
            WHERE status = 'SCHEDULED'
              AND (scheduled_at IS NULL OR scheduled_at <= $1)
            ORDER BY id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_campaign).collect()
    }

    async fn update_status(&self, id: i64, status: CampaignStatus) -> CourierResult<()> {
        sqlx::query("UPDATE campaigns SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_stats(&self, id: i64, stats: &CampaignStats) -> CourierResult<()> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET total_sent = $2, total_failed = $3, total_bounced = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(stats.total_sent)
        .bind(stats.total_failed)
        .bind(stats.total_bounced)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
