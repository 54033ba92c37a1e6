use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_core::CourierResult;
use courier_domain::entities::{CampaignSenderLink, SenderAccount};
use courier_domain::repositories::SenderAccountRepository;

pub struct PostgresSenderAccountRepository {
    pool: PgPool,
}

impl PostgresSenderAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: &sqlx::postgres::PgRow) -> CourierResult<SenderAccount> {
        Ok(SenderAccount {
            id: row.try_get("id")?,
            address: row.try_get("address")?,
            display_name: row.try_get("display_name")?,
            active: row.try_get("active")?,
            owner_rep_id: row.try_get("owner_rep_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_link(row: &sqlx::postgres::PgRow) -> CourierResult<CampaignSenderLink> {
        Ok(CampaignSenderLink {
            campaign_id: row.try_get("campaign_id")?,
            account_id: row.try_get("account_id")?,
            times_used: row.try_get("times_used")?,
            registered_at: row.try_get("registered_at")?,
        })
    }
}

#[async_trait]
impl SenderAccountRepository for PostgresSenderAccountRepository {
    async fn get_by_id(&self, id: i64) -> CourierResult<Option<SenderAccount>> {
        let row = sqlx::query("SELECT * FROM sender_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_account(&r)).transpose()
    }

    async fn find_active(&self) -> CourierResult<Vec<SenderAccount>> {
        let rows = sqlx::query("SELECT * FROM sender_accounts WHERE active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_account).collect()
    }

    async fn find_active_by_owner(&self, rep_id: i64) -> CourierResult<Option<SenderAccount>> {
        let row = sqlx::query(
            "SELECT * FROM sender_accounts WHERE active = TRUE AND owner_rep_id = $1 LIMIT 1",
        )
        .bind(rep_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_account(&r)).transpose()
    }

    async fn registrations(&self, campaign_id: i64) -> CourierResult<Vec<CampaignSenderLink>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM campaign_senders
            WHERE campaign_id = $1
            ORDER BY times_used ASC, registered_at ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_link).collect()
    }

    async fn register(&self, campaign_id: i64, account_id: i64) -> CourierResult<()> {
        sqlx::query(
            r#"
            INSERT INTO campaign_senders (campaign_id, account_id, times_used, registered_at)
            VALUES ($1, $2, 0, NOW())
            ON CONFLICT (campaign_id, account_id) DO NOTHING
            "#,
        )
        .bind(campaign_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_times_used(&self, campaign_id: i64, account_id: i64) -> CourierResult<()> {
        sqlx::query(
            r#"
            UPDATE campaign_senders
            SET times_used = times_used + 1
            WHERE campaign_id = $1 AND account_id = $2
            "#,
        )
        .bind(campaign_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
