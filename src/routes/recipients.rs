use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::importer::{import_file, stage_upload};
use crate::models::{DataResponse, Recipient};
use crate::store::recipients::list_recipients as fetch_recipients;
use crate::tabular::{NAME_COLUMN, TabularError};

/// List the active mailing list in insertion order.
#[openapi(tag = "Recipients")]
#[get("/recipients")]
pub async fn list_recipients(
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<Recipient>>>, ApiError> {
    let recipients = fetch_recipients(pool.inner()).await?;
    Ok(Json(DataResponse { data: recipients }))
}

/// Multipart body for a recipient list upload.
#[derive(FromForm)]
pub struct RecipientUpload<'r> {
    file: TempFile<'r>,
}

/// Replace the whole recipient list with the rows of an uploaded file.
#[openapi(skip)]
#[post("/recipients/import", data = "<upload>")]
pub async fn import_recipients(
    mut upload: Form<RecipientUpload<'_>>,
    pool: &State<sqlx::PgPool>,
    config: &State<AppConfig>,
) -> Result<Redirect, ApiError> {
    if upload.file.len() == 0 {
        return Err(ApiError::ImportFormat(
            TabularError::MissingColumn(NAME_COLUMN).to_string(),
        ));
    }

    // Removed from disk when `staged` drops, whatever the import outcome.
    let staged = stage_upload(&config.upload_dir)
        .map_err(|e| ApiError::InternalError(format!("failed to stage upload: {e}")))?;
    upload
        .file
        .copy_to(staged.path())
        .await
        .map_err(|e| ApiError::InternalError(format!("failed to store upload: {e}")))?;

    import_file(pool.inner(), staged.path(), config.tabular).await?;

    Ok(Redirect::to("/api/v1/recipients"))
}
