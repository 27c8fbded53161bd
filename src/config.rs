use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::tabular::TabularFormat;

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

/// Accepts a single ASCII character, or the escapes `\t` and `tab`.
fn parse_delimiter(value: &str) -> Option<u8> {
    match value {
        "\\t" | "tab" => Some(b'\t'),
        other if other.len() == 1 && other.is_ascii() => other.bytes().next(),
        _ => None,
    }
}

/// How outbound campaign mail leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Real delivery through an SMTP relay.
    #[default]
    Smtp,
    /// Simulated delivery: every message is written to the log only.
    Log,
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(TransportMode::Smtp),
            "log" | "simulate" | "simulated" => Ok(TransportMode::Log),
            other => Err(format!("unknown mail transport '{other}'")),
        }
    }
}

/// Relay settings used when [`TransportMode::Smtp`] is active.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_string("SMTP_HOST", "smtp.gmail.com"),
            port: env_u16("SMTP_PORT", 587),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
        }
    }
}

/// Application settings loaded from environment variables.
///
/// The database URL is not part of this struct; it comes from Rocket's
/// figment under `databases.campaign_db`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
    pub tabular: TabularFormat,
    pub transport: TransportMode,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let upload_dir = PathBuf::from(env_string("UPLOAD_FOLDER", "./uploads"));

        let tabular = match env::var("TABULAR_DELIMITER") {
            Ok(raw) => match parse_delimiter(&raw) {
                Some(delimiter) => TabularFormat::new(delimiter),
                None => {
                    log::warn!("ignoring invalid TABULAR_DELIMITER '{raw}', using ','");
                    TabularFormat::default()
                }
            },
            Err(_) => TabularFormat::default(),
        };

        let transport = match env::var("MAIL_TRANSPORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                log::warn!("{err}; falling back to smtp");
                TransportMode::Smtp
            }),
            Err(_) => TransportMode::default(),
        };

        Self {
            upload_dir,
            tabular,
            transport,
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            tabular: TabularFormat::default(),
            transport: TransportMode::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_mode_parses_known_names() {
        assert_eq!("smtp".parse::<TransportMode>(), Ok(TransportMode::Smtp));
        assert_eq!(" LOG ".parse::<TransportMode>(), Ok(TransportMode::Log));
        assert_eq!("simulated".parse::<TransportMode>(), Ok(TransportMode::Log));
        assert!("carrier-pigeon".parse::<TransportMode>().is_err());
    }

    #[test]
    fn delimiter_accepts_single_ascii_and_tab() {
        assert_eq!(parse_delimiter(";"), Some(b';'));
        assert_eq!(parse_delimiter("\\t"), Some(b'\t'));
        assert_eq!(parse_delimiter("tab"), Some(b'\t'));
        assert_eq!(parse_delimiter(";;"), None);
        assert_eq!(parse_delimiter("é"), None);
    }

    #[test]
    fn defaults_point_at_gmail_relay() {
        let config = AppConfig::default();
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.tabular.delimiter, b',');
        assert_eq!(config.transport, TransportMode::Smtp);
    }
}
