//! Campaign sending: one message per current recipient, then one log entry.
//!
//! Deliveries run sequentially. A failure for one recipient is logged and
//! recorded in the summary but never stops the loop. The campaign record is
//! written exactly once, after every attempt has settled.

use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::mailer::{MailTransport, OutgoingMessage, SenderCredentials, TransportError};
use crate::models::{CampaignRecord, Recipient};
use crate::store::campaigns::append_campaign;
use crate::store::recipients::list_recipients;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Operator-supplied description of a campaign.
#[derive(Debug, Clone)]
pub struct CampaignRequest {
    pub campaign_name: String,
    pub subject: String,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_credential: Option<String>,
    pub content: String,
}

impl CampaignRequest {
    /// Relay login derived from the sender address. A blank credential means
    /// no authentication is attempted.
    pub fn credentials(&self) -> Option<SenderCredentials> {
        self.sender_credential
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| SenderCredentials::new(self.sender_email.clone(), secret))
    }

    pub fn message_for(&self, recipient: &Recipient) -> OutgoingMessage {
        OutgoingMessage {
            sender_name: self.sender_name.clone(),
            sender_email: self.sender_email.clone(),
            to: recipient.email.clone(),
            subject: self.subject.clone(),
            html_body: self.content.clone(),
        }
    }
}

/// Result of one delivery attempt.
#[derive(Debug)]
pub struct DeliveryReport {
    pub email: String,
    pub outcome: Result<(), TransportError>,
}

/// Everything that happened during one campaign run.
#[derive(Debug)]
pub struct CampaignSummary {
    pub record: CampaignRecord,
    pub deliveries: Vec<DeliveryReport>,
}

impl CampaignSummary {
    pub fn attempted(&self) -> usize {
        self.deliveries.len()
    }

    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|report| report.outcome.is_ok())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.delivered()
    }
}

/// Send `request` to every current recipient through `transport`.
///
/// Only store failures are returned as errors; delivery failures end up in
/// [`CampaignSummary::deliveries`].
pub async fn send_campaign(
    pool: &PgPool,
    transport: &dyn MailTransport,
    request: &CampaignRequest,
) -> Result<CampaignSummary, CampaignError> {
    let recipients = list_recipients(pool).await?;
    log::info!(
        "sending campaign '{}' to {} recipients",
        request.campaign_name,
        recipients.len()
    );

    let credentials = request.credentials();
    let mut deliveries = Vec::with_capacity(recipients.len());

    for recipient in &recipients {
        let message = request.message_for(recipient);
        let outcome = transport.deliver(&message, credentials.as_ref()).await;

        match &outcome {
            Ok(()) => log::debug!("sent campaign '{}' to {}", request.campaign_name, recipient.email),
            Err(err) => log::warn!("failed to send to {}: {}", recipient.email, err),
        }

        deliveries.push(DeliveryReport {
            email: recipient.email.clone(),
            outcome,
        });
    }

    let record = append_campaign(pool, &request.campaign_name).await?;

    let summary = CampaignSummary { record, deliveries };
    log::info!(
        "campaign '{}' finished: {} delivered, {} failed",
        summary.record.campaign_name,
        summary.delivered(),
        summary.failed()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(credential: Option<&str>) -> CampaignRequest {
        CampaignRequest {
            campaign_name: "Promo1".to_string(),
            subject: "Ofertas".to_string(),
            sender_name: "Loja".to_string(),
            sender_email: "loja@x.com".to_string(),
            sender_credential: credential.map(str::to_string),
            content: "<h1>Oi</h1>".to_string(),
        }
    }

    #[test]
    fn blank_credential_disables_authentication() {
        assert!(request(None).credentials().is_none());
        assert!(request(Some("")).credentials().is_none());

        let creds = request(Some("app-password")).credentials().unwrap();
        assert_eq!(creds.username, "loja@x.com");
        assert_eq!(creds.secret, "app-password");
    }

    #[test]
    fn message_is_addressed_to_the_recipient() {
        let recipient = Recipient {
            id: 7,
            name: "Bob".to_string(),
            email: "b@x.com".to_string(),
        };
        let message = request(None).message_for(&recipient);
        assert_eq!(message.to, "b@x.com");
        assert_eq!(message.from_header(), "Loja <loja@x.com>");
        assert_eq!(message.subject, "Ofertas");
        assert_eq!(message.html_body, "<h1>Oi</h1>");
    }
}
