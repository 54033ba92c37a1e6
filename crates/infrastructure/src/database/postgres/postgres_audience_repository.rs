use async_trait::async_trait;
use sqlx::{PgPool, Row};

use courier_core::CourierResult;
use courier_domain::entities::{Contact, DirectoryFilter, PlatformFilter, PlatformUser};
use courier_domain::repositories::AudienceRepository;
use courier_domain::value_objects::normalize_email;

pub struct PostgresAudienceRepository {
    pool: PgPool,
}

impl PostgresAudienceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_contact(row: &sqlx::postgres::PgRow) -> CourierResult<Contact> {
        Ok(Contact {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            tags: row.try_get::<Vec<String>, _>("tags").unwrap_or_default(),
            temperature: row.try_get("temperature")?,
            do_not_contact: row.try_get("do_not_contact")?,
            rep_id: row.try_get("rep_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_platform_user(row: &sqlx::postgres::PgRow) -> CourierResult<PlatformUser> {
        Ok(PlatformUser {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            is_rep: row.try_get("is_rep")?,
            tier: row.try_get("tier")?,
        })
    }
}

#[async_trait]
impl AudienceRepository for PostgresAudienceRepository {
    async fn directory_contacts(
        &self,
        campaign_id: i64,
        filter: &DirectoryFilter,
    ) -> CourierResult<Vec<Contact>> {
        // do-not-contact与活动排除名单在查询里强制过滤
        let tags: Option<&[String]> = if filter.tags.is_empty() {
            None
        } else {
            Some(filter.tags.as_slice())
        };

        let rows = sqlx::query(
            r#"
            SELECT c.* FROM contacts c
            WHERE c.do_not_contact = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM campaign_exclusions e
                  WHERE e.campaign_id = $1 AND e.email = LOWER(TRIM(c.email))
              )
              AND ($2::text[] IS NULL OR c.tags && $2)
              AND ($3::text IS NULL OR c.temperature = $3)
            ORDER BY c.id
            "#,
        )
        .bind(campaign_id)
        .bind(tags)
        .bind(filter.temperature.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_contact).collect()
    }

    async fn platform_users(&self, filter: &PlatformFilter) -> CourierResult<Vec<PlatformUser>> {
        let tiers: Option<&[String]> = if filter.tiers.is_empty() {
            None
        } else {
            Some(filter.tiers.as_slice())
        };

        let rows = sqlx::query(
            r#"
            SELECT * FROM platform_users
            WHERE ($1 = FALSE OR is_rep = TRUE)
              AND ($2::text[] IS NULL OR tier = ANY($2))
            ORDER BY id
            "#,
        )
        .bind(filter.reps_only)
        .bind(tiers)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_platform_user).collect()
    }

    async fn is_suppressed(&self, email: &str) -> CourierResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM suppressions WHERE email = $1) AS suppressed",
        )
        .bind(normalize_email(email))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("suppressed")?)
    }
}
