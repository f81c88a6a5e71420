//! Campaign repository, including the campaign_payouts child table

use crate::domain::{
    ActivityStatus, Campaign, CampaignChanges, CampaignFilter, NewCampaign, NewPayout, Payout,
    StringUuid,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};

const CAMPAIGN_COLUMNS: &str =
    "id, advertiser_id, title, landing_page_url, activity_status, created_at, updated_at";
const PAYOUT_COLUMNS: &str = "id, campaign_id, country, payout_value, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Campaign>>;
    /// Payouts of every listed campaign, grouped by campaign in submitted order.
    async fn list_payouts(&self, campaign_ids: &[StringUuid]) -> Result<Vec<Payout>>;
    async fn list_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Campaign>>;
    async fn count_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
    ) -> Result<i64>;
    /// Insert a paused campaign together with its payouts.
    async fn create(&self, advertiser_id: StringUuid, input: &NewCampaign) -> Result<Campaign>;
    /// Apply field changes and, when given, replace the payout set atomically.
    async fn update(&self, id: StringUuid, changes: &CampaignChanges) -> Result<Campaign>;
    async fn update_status(&self, id: StringUuid, status: ActivityStatus) -> Result<Campaign>;
    /// Swap the whole payout set without touching the campaign row.
    async fn replace_payouts(
        &self,
        campaign_id: StringUuid,
        payouts: &[NewPayout],
    ) -> Result<Vec<Payout>>;
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct CampaignRepositoryImpl {
    pool: MySqlPool,
}

impl CampaignRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for CampaignRepositoryImpl {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Campaign>> {
        let campaign = sqlx::query_as::<_, Campaign>(&format!(
            "SELECT {} FROM campaigns WHERE id = ?",
            CAMPAIGN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(campaign)
    }

    async fn list_payouts(&self, campaign_ids: &[StringUuid]) -> Result<Vec<Payout>> {
        if campaign_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {} FROM campaign_payouts WHERE campaign_id IN (",
            PAYOUT_COLUMNS
        ));
        let mut separated = qb.separated(", ");
        for id in campaign_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY campaign_id, position");

        let payouts = qb
            .build_query_as::<Payout>()
            .fetch_all(&self.pool)
            .await?;

        Ok(payouts)
    }

    async fn list_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Campaign>> {
        let mut qb: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {} FROM campaigns", CAMPAIGN_COLUMNS));
        push_filter(&mut qb, advertiser_id, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let campaigns = qb
            .build_query_as::<Campaign>()
            .fetch_all(&self.pool)
            .await?;

        Ok(campaigns)
    }

    async fn count_for_advertiser(
        &self,
        advertiser_id: StringUuid,
        filter: &CampaignFilter,
    ) -> Result<i64> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM campaigns");
        push_filter(&mut qb, advertiser_id, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn create(&self, advertiser_id: StringUuid, input: &NewCampaign) -> Result<Campaign> {
        let id = StringUuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO campaigns (id, advertiser_id, title, landing_page_url, activity_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(advertiser_id)
        .bind(&input.title)
        .bind(&input.landing_page_url)
        .bind(ActivityStatus::Paused)
        .execute(&mut *tx)
        .await?;

        insert_payouts(&mut tx, id, &input.payouts).await?;

        let campaign = fetch_campaign(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create campaign")))?;

        tx.commit().await?;
        Ok(campaign)
    }

    async fn update(&self, id: StringUuid, changes: &CampaignChanges) -> Result<Campaign> {
        let mut tx = self.pool.begin().await?;

        if changes.title.is_some() || changes.landing_page_url.is_some() {
            sqlx::query(
                r#"
                UPDATE campaigns
                SET title = COALESCE(?, title),
                    landing_page_url = COALESCE(?, landing_page_url),
                    updated_at = NOW()
                WHERE id = ?
                "#,
            )
            .bind(&changes.title)
            .bind(&changes.landing_page_url)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(payouts) = &changes.payouts {
            swap_payouts(&mut tx, id, payouts).await?;
        }

        let campaign = fetch_campaign(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", id)))?;

        tx.commit().await?;
        Ok(campaign)
    }

    async fn update_status(&self, id: StringUuid, status: ActivityStatus) -> Result<Campaign> {
        sqlx::query("UPDATE campaigns SET activity_status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", id)))
    }

    async fn replace_payouts(
        &self,
        campaign_id: StringUuid,
        payouts: &[NewPayout],
    ) -> Result<Vec<Payout>> {
        let mut tx = self.pool.begin().await?;
        swap_payouts(&mut tx, campaign_id, payouts).await?;
        tx.commit().await?;

        self.list_payouts(&[campaign_id]).await
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Campaign {} not found", id)));
        }
        Ok(())
    }
}

/// Append the owner and optional filters as a WHERE clause.
fn push_filter(qb: &mut QueryBuilder<'_, MySql>, advertiser_id: StringUuid, filter: &CampaignFilter) {
    qb.push(" WHERE advertiser_id = ");
    qb.push_bind(advertiser_id);

    if let Some(title) = &filter.title_contains {
        qb.push(" AND LOWER(title) LIKE ");
        qb.push_bind(format!("%{}%", escape_like(&title.to_lowercase())));
    }
    if let Some(status) = filter.status {
        qb.push(" AND activity_status = ");
        qb.push_bind(status);
    }
}

/// Escape LIKE metacharacters so the needle matches literally.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn fetch_campaign(conn: &mut MySqlConnection, id: StringUuid) -> Result<Option<Campaign>> {
    let campaign = sqlx::query_as::<_, Campaign>(&format!(
        "SELECT {} FROM campaigns WHERE id = ?",
        CAMPAIGN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(campaign)
}

/// Delete then re-insert inside the caller's transaction.
async fn swap_payouts(
    conn: &mut MySqlConnection,
    campaign_id: StringUuid,
    payouts: &[NewPayout],
) -> Result<()> {
    sqlx::query("DELETE FROM campaign_payouts WHERE campaign_id = ?")
        .bind(campaign_id)
        .execute(&mut *conn)
        .await?;
    insert_payouts(conn, campaign_id, payouts).await
}

async fn insert_payouts(
    conn: &mut MySqlConnection,
    campaign_id: StringUuid,
    payouts: &[NewPayout],
) -> Result<()> {
    for (position, payout) in payouts.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO campaign_payouts (id, campaign_id, country, payout_value, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(StringUuid::new_v4())
        .bind(campaign_id)
        .bind(payout.country)
        .bind(payout.payout_value)
        .bind(position as u16)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
