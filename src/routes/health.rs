//! Liveness and readiness probes.

use rocket::State;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Basic response payload describing API health.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Static status string reporting application readiness.
    pub status: String,
}

/// Liveness probe; never touches the database.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe; succeeds once the database answers a trivial query.
#[openapi(tag = "Health")]
#[get("/health/ready")]
pub async fn readiness_check(
    pool: &State<sqlx::PgPool>,
) -> Result<Json<HealthResponse>, ApiError> {
    sqlx::query("SELECT 1").execute(pool.inner()).await?;

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
    }))
}
