use rocket_db_pools::{sqlx, Database};

/// Pool configured from `databases.campaign_db` in the Rocket figment.
#[derive(Database)]
#[database("campaign_db")]
pub struct CampaignDb(sqlx::PgPool);
