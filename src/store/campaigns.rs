//! Append-only campaign send log.

use crate::models::CampaignRecord;
use rocket_db_pools::sqlx::{self, postgres::PgExecutor};

pub async fn list_campaigns<'e, E>(executor: E) -> Result<Vec<CampaignRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignRecord>(
        "SELECT id, campaign_name, opens_count, clicks_count FROM campaign_records ORDER BY id ASC",
    )
    .fetch_all(executor)
    .await
}

/// Append one record. No tracking exists, so both counters are stored as zero.
pub async fn append_campaign<'e, E>(
    executor: E,
    campaign_name: &str,
) -> Result<CampaignRecord, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CampaignRecord>(
        r#"INSERT INTO campaign_records (campaign_name, opens_count, clicks_count)
           VALUES ($1, 0, 0)
           RETURNING id, campaign_name, opens_count, clicks_count"#,
    )
    .bind(campaign_name)
    .fetch_one(executor)
    .await
}
