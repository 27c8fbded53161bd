//! Queries against the `excluded_recipients` table. Rows are only ever added.

use crate::models::{Contact, ExcludedRecipient};
use rocket_db_pools::sqlx::{self, postgres::PgExecutor};

pub async fn list_excluded<'e, E>(executor: E) -> Result<Vec<ExcludedRecipient>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ExcludedRecipient>(
        "SELECT id, name, email FROM excluded_recipients ORDER BY id ASC",
    )
    .fetch_all(executor)
    .await
}

pub async fn insert_excluded<'e, E>(executor: E, contact: &Contact) -> Result<i32, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar(
        "INSERT INTO excluded_recipients (name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind(&contact.name)
    .bind(&contact.email)
    .fetch_one(executor)
    .await
}
