use rocket::State;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::unsubscribe::{CONFIRMATION, unsubscribe as move_to_exclusions};

/// Remove an address from the mailing list.
///
/// The response is identical whether or not the address was subscribed.
#[openapi(tag = "Unsubscribe")]
#[get("/unsubscribe/<email>")]
pub async fn unsubscribe(email: String, pool: &State<sqlx::PgPool>) -> Result<String, ApiError> {
    move_to_exclusions(pool.inner(), &email).await?;
    Ok(CONFIRMATION.to_string())
}
