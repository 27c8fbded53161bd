use rocket::form::Form;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::sqlx;
use rocket_okapi::openapi;

use crate::campaign::{CampaignRequest, send_campaign as run_campaign};
use crate::error::ApiError;
use crate::mailer::SharedTransport;
use crate::models::{CampaignRecord, DataResponse};
use crate::store::campaigns::list_campaigns;

/// Send history, oldest first.
#[openapi(tag = "Campaigns")]
#[get("/campaigns")]
pub async fn list_campaign_history(
    pool: &State<sqlx::PgPool>,
) -> Result<Json<DataResponse<Vec<CampaignRecord>>>, ApiError> {
    let records = list_campaigns(pool.inner()).await?;
    Ok(Json(DataResponse { data: records }))
}

/// Fields of the campaign composition form.
#[derive(Debug, FromForm)]
pub struct CampaignForm {
    campaign_name: String,
    subject: String,
    sender_name: String,
    sender_email: String,
    sender_credential: Option<String>,
    content: String,
}

impl From<CampaignForm> for CampaignRequest {
    fn from(form: CampaignForm) -> Self {
        CampaignRequest {
            campaign_name: form.campaign_name,
            subject: form.subject,
            sender_name: form.sender_name,
            sender_email: form.sender_email,
            sender_credential: form.sender_credential,
            content: form.content,
        }
    }
}

/// Send a campaign to every current recipient, then show the history.
///
/// Individual delivery failures are logged and never change the response.
#[openapi(skip)]
#[post("/campaigns/send", data = "<form>")]
pub async fn send_campaign(
    form: Form<CampaignForm>,
    pool: &State<sqlx::PgPool>,
    transport: &State<SharedTransport>,
) -> Result<Redirect, ApiError> {
    let request = CampaignRequest::from(form.into_inner());
    run_campaign(pool.inner(), transport.inner().as_ref(), &request).await?;

    Ok(Redirect::to("/api/v1/campaigns"))
}
