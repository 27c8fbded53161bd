use std::fmt;

use lettre::{Address, Message};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;

use super::transport::TransportError;

/// Login identity used to authenticate against the relay.
#[derive(Clone)]
pub struct SenderCredentials {
    pub username: String,
    pub secret: String,
}

impl SenderCredentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for SenderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// One addressed campaign message. The body is HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub sender_name: String,
    pub sender_email: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMessage {
    /// `From` header value in `Name <address>` form.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender_email)
    }

    /// Render into a wire-ready message, validating both addresses.
    pub fn to_lettre(&self) -> Result<Message, TransportError> {
        let sender_address: Address =
            self.sender_email
                .parse()
                .map_err(|source| TransportError::Address {
                    address: self.sender_email.clone(),
                    source,
                })?;
        let sender_name = Some(self.sender_name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let from = Mailbox::new(sender_name, sender_address);

        let to: Mailbox = self.to.parse().map_err(|source| TransportError::Address {
            address: self.to.clone(),
            source,
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(self.html_body.clone())?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutgoingMessage {
        OutgoingMessage {
            sender_name: "Ana".to_string(),
            sender_email: "ana@loja.com".to_string(),
            to: "b@x.com".to_string(),
            subject: "Promo".to_string(),
            html_body: "<p>Oferta</p>".to_string(),
        }
    }

    #[test]
    fn from_header_joins_name_and_address() {
        assert_eq!(sample().from_header(), "Ana <ana@loja.com>");
    }

    #[test]
    fn rendered_message_carries_headers_and_html_body() {
        let rendered = String::from_utf8(sample().to_lettre().unwrap().formatted()).unwrap();
        assert!(rendered.contains("From: Ana <ana@loja.com>"));
        assert!(rendered.contains("To: b@x.com"));
        assert!(rendered.contains("Subject: Promo"));
        assert!(rendered.contains("text/html"));
        assert!(rendered.contains("<p>Oferta</p>"));
    }

    #[test]
    fn invalid_recipient_address_is_rejected() {
        let mut message = sample();
        message.to = "not-an-address".to_string();
        match message.to_lettre().unwrap_err() {
            TransportError::Address { address, .. } => assert_eq!(address, "not-an-address"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = SenderCredentials::new("ana@loja.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("ana@loja.com"));
        assert!(!debug.contains("hunter2"));
    }
}
