use rocket::http::{ContentType, Header};
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::exporter::export_excluded;
use crate::models::{DataResponse, ExcludedRecipient};
use crate::store::exclusions::list_excluded;

/// Downloadable file body with its disposition header.
#[derive(Responder)]
#[response(status = 200)]
pub struct Attachment {
    body: Vec<u8>,
    content_type: ContentType,
    disposition: Header<'static>,
}

impl Attachment {
    fn new(file_name: &str, content_type: ContentType, body: Vec<u8>) -> Self {
        Self {
            body,
            content_type,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{file_name}\""),
            ),
        }
    }
}

/// List unsubscribed recipients in insertion order.
#[openapi(tag = "Exclusions")]
#[get("/exclusions")]
pub async fn list_exclusions(
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<ExcludedRecipient>>>, ApiError> {
    let excluded = list_excluded(pool.inner()).await?;
    Ok(Json(DataResponse { data: excluded }))
}

/// Download the exclusion list as a contact file.
#[openapi(skip)]
#[get("/exclusions/export")]
pub async fn export_exclusions(
    pool: &State<sqlx::PgPool>,
    config: &State<AppConfig>,
) -> Result<Attachment, ApiError> {
    let export = export_excluded(pool.inner(), &config.upload_dir, config.tabular).await?;

    let content_type = match config.tabular.extension() {
        "tsv" => ContentType::new("text", "tab-separated-values"),
        _ => ContentType::CSV,
    };

    Ok(Attachment::new(&export.file_name, content_type, export.contents))
}
