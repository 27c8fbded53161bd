//! Outbound mail: message construction and the transports that deliver it.
//!
//! Campaign code only sees the [`MailTransport`] trait. Two implementations
//! exist: [`SmtpRelay`] opens one authenticated STARTTLS session per message,
//! [`LogTransport`] simulates delivery by logging what would have been sent.

pub mod message;
pub mod smtp;
pub mod transport;

pub use message::{OutgoingMessage, SenderCredentials};
pub use smtp::SmtpRelay;
pub use transport::{LogTransport, MailTransport, SharedTransport, TransportError};

use crate::config::{AppConfig, TransportMode};
use std::sync::Arc;

/// Build the transport selected by configuration.
pub fn transport_from_config(config: &AppConfig) -> SharedTransport {
    match config.transport {
        TransportMode::Smtp => {
            log::info!(
                "mail transport: smtp relay {}:{}",
                config.smtp.host,
                config.smtp.port
            );
            Arc::new(SmtpRelay::new(config.smtp.host.clone(), config.smtp.port))
        }
        TransportMode::Log => {
            log::info!("mail transport: simulated (log only)");
            Arc::new(LogTransport)
        }
    }
}
