//! Queries against the `recipients` table.

use crate::models::{Contact, Recipient};
use rocket_db_pools::sqlx::{self, postgres::PgExecutor};

pub async fn list_recipients<'e, E>(executor: E) -> Result<Vec<Recipient>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Recipient>("SELECT id, name, email FROM recipients ORDER BY id ASC")
        .fetch_all(executor)
        .await
}

/// Look up a recipient by exact email, locking the row for the rest of the
/// surrounding transaction.
pub async fn find_recipient_by_email<'e, E>(
    executor: E,
    email: &str,
) -> Result<Option<Recipient>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Recipient>(
        "SELECT id, name, email FROM recipients WHERE email = $1 FOR UPDATE",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn insert_recipient<'e, E>(executor: E, contact: &Contact) -> Result<i32, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar("INSERT INTO recipients (name, email) VALUES ($1, $2) RETURNING id")
        .bind(&contact.name)
        .bind(&contact.email)
        .fetch_one(executor)
        .await
}

/// Remove every recipient, returning how many rows were dropped.
pub async fn delete_all_recipients<'e, E>(executor: E) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM recipients").execute(executor).await?;
    Ok(result.rows_affected())
}

pub async fn delete_recipient<'e, E>(executor: E, id: i32) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM recipients WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
