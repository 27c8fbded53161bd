use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::message::{OutgoingMessage, SenderCredentials};
use super::transport::{MailTransport, TransportError};

/// STARTTLS relay. Each delivery opens, authenticates and closes its own
/// session so a failed login only affects that recipient. lettre's `pool`
/// feature is off, so the transport built per message holds no idle
/// connections once `send` returns.
#[derive(Debug, Clone)]
pub struct SmtpRelay {
    host: String,
    port: u16,
}

impl SmtpRelay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[rocket::async_trait]
impl MailTransport for SmtpRelay {
    async fn deliver(
        &self,
        message: &OutgoingMessage,
        credentials: Option<&SenderCredentials>,
    ) -> Result<(), TransportError> {
        let email = message.to_lettre()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?.port(self.port);
        if let Some(credentials) = credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username.clone(),
                credentials.secret.clone(),
            ));
        }

        let response = builder.build().send(email).await?;
        if !response.is_positive() {
            return Err(TransportError::Rejected(format!(
                "{} {}",
                response.code(),
                response.message().collect::<Vec<_>>().join(" ")
            )));
        }

        log::debug!("delivered to {} via {}:{}", message.to, self.host, self.port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            sender_name: "Loja".to_string(),
            sender_email: "loja@x.com".to_string(),
            to: to.to_string(),
            subject: "Promo".to_string(),
            html_body: "<p>Oi</p>".to_string(),
        }
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn invalid_address_fails_before_connecting() {
        let relay = SmtpRelay::new("127.0.0.1", closed_port());
        let err = relay.deliver(&message("nope"), None).await.unwrap_err();
        assert!(matches!(err, TransportError::Address { .. }));
    }

    #[tokio::test]
    async fn each_delivery_reports_its_own_connection_failure() {
        let relay = SmtpRelay::new("127.0.0.1", closed_port());
        let credentials = SenderCredentials::new("loja@x.com", "secret");

        for to in ["a@x.com", "b@x.com"] {
            let err = relay
                .deliver(&message(to), Some(&credentials))
                .await
                .unwrap_err();
            assert!(matches!(err, TransportError::Smtp(_)), "{to}: {err:?}");
        }
    }
}
