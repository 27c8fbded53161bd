use std::sync::Arc;

use lettre::address::AddressError;
use thiserror::Error;

use super::message::{OutgoingMessage, SenderCredentials};

/// Failure delivering a single message. Scoped to one recipient.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Capability to deliver one addressed message.
#[rocket::async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        message: &OutgoingMessage,
        credentials: Option<&SenderCredentials>,
    ) -> Result<(), TransportError>;
}

pub type SharedTransport = Arc<dyn MailTransport>;

/// Simulated delivery that only writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[rocket::async_trait]
impl MailTransport for LogTransport {
    async fn deliver(
        &self,
        message: &OutgoingMessage,
        _credentials: Option<&SenderCredentials>,
    ) -> Result<(), TransportError> {
        log::info!("simulated send to: {}", message.to);
        log::info!("  subject: {}", message.subject);
        log::info!("  from: {}", message.from_header());
        log::debug!("  content: {}", message.html_body);
        Ok(())
    }
}
