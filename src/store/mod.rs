//! Persistence for the three independent tables: active recipients, excluded
//! recipients and the campaign send log.
//!
//! Every query helper takes a generic `PgExecutor` so the same function runs
//! against the pool or inside a caller-owned transaction.

pub mod campaigns;
pub mod exclusions;
pub mod migration;
pub mod recipients;

pub use migration::run_migrations;

use rocket_db_pools::sqlx;

/// SQLSTATE raised by Postgres when a UNIQUE constraint rejects a row.
const UNIQUE_VIOLATION: &str = "23505";

/// Returns true when `err` is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().map(|code| code == UNIQUE_VIOLATION).unwrap_or(false)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
