//! Schema management.
//!
//! The three tables are created by SQLx migrations applied before the API
//! starts serving requests. Startup aborts when a migration fails.

use rocket_db_pools::sqlx::{self, PgPool, migrate::Migrator};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations.
///
/// Already-applied migrations are skipped, so this is safe on every boot.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");

    MIGRATOR.run(pool).await?;

    log::info!("database migrations up to date");
    Ok(())
}

