use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use lettre::message::Mailbox;
use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_SITE_NAME: &str = "Website";
const DEFAULT_SUBJECT_PREFIX: &str = "New contact form submission";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything the server needs, read once at startup and handed to the
/// router as state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub allowed_origin: Option<HeaderValue>,
    pub static_dir: Option<PathBuf>,
    pub sentry_dsn: Option<String>,
    pub mail: MailSettings,
    pub relay: RelaySettings,
}

/// Addressing and wording of the notification email.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub recipient: Mailbox,
    pub sender: Mailbox,
    pub site_name: String,
    pub subject_prefix: String,
}

#[derive(Debug, Clone)]
pub enum RelaySettings {
    Smtp(SmtpSettings),
    /// Writes notifications to the log instead of sending them.
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    StartTls,
    Tls,
    None,
}

impl TlsMode {
    pub fn default_port(self) -> u16 {
        match self {
            TlsMode::StartTls => 587,
            TlsMode::Tls => 465,
            TlsMode::None => 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub credentials: Option<SmtpCredentials>,
}

#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map. Empty values
    /// count as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bind_address = get("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDRESS",
                reason: e.to_string(),
            })?;

        let mail = MailSettings {
            recipient: parse_mailbox("CONTACT_RECIPIENT", &require("CONTACT_RECIPIENT")?)?,
            sender: parse_mailbox("CONTACT_SENDER", &require("CONTACT_SENDER")?)?,
            site_name: get("SITE_NAME").unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            subject_prefix: get("CONTACT_SUBJECT_PREFIX")
                .unwrap_or_else(|| DEFAULT_SUBJECT_PREFIX.to_string()),
        };

        let relay = match get("MAIL_RELAY").as_deref().unwrap_or("smtp") {
            "smtp" => {
                let tls = match get("SMTP_TLS").as_deref().unwrap_or("starttls") {
                    "starttls" => TlsMode::StartTls,
                    "tls" => TlsMode::Tls,
                    "none" => TlsMode::None,
                    other => {
                        return Err(ConfigError::Invalid {
                            name: "SMTP_TLS",
                            reason: format!("expected starttls, tls or none, got {}", other),
                        })
                    }
                };
                let port = match get("SMTP_PORT") {
                    Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        name: "SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => tls.default_port(),
                };
                let credentials = match (get("SMTP_USERNAME"), get("SMTP_PASSWORD")) {
                    (Some(username), Some(password)) => Some(SmtpCredentials { username, password }),
                    (None, None) => None,
                    _ => {
                        return Err(ConfigError::Invalid {
                            name: "SMTP_USERNAME",
                            reason: "SMTP_USERNAME and SMTP_PASSWORD must be set together".to_string(),
                        })
                    }
                };
                RelaySettings::Smtp(SmtpSettings {
                    host: require("SMTP_HOST")?,
                    port,
                    tls,
                    credentials,
                })
            }
            "log" => RelaySettings::Log,
            other => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_RELAY",
                    reason: format!("expected smtp or log, got {}", other),
                })
            }
        };

        let allowed_origin = get("ALLOWED_ORIGIN")
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| ConfigError::Invalid {
                    name: "ALLOWED_ORIGIN",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            bind_address,
            allowed_origin,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            sentry_dsn: get("SENTRY_DSN"),
            mail,
            relay,
        })
    }
}

fn parse_mailbox(name: &'static str, value: &str) -> Result<Mailbox, ConfigError> {
    value.parse::<Mailbox>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CONTACT_RECIPIENT", "owner@example.com"),
            ("CONTACT_SENDER", "Example Site <no-reply@example.com>"),
            ("SMTP_HOST", "smtp.example.com"),
        ]
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_vars(&vars(&base())).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.mail.site_name, "Website");
        assert_eq!(config.mail.subject_prefix, "New contact form submission");
        assert_eq!(config.mail.sender.name.as_deref(), Some("Example Site"));
        assert!(config.allowed_origin.is_none());
        match config.relay {
            RelaySettings::Smtp(smtp) => {
                assert_eq!(smtp.host, "smtp.example.com");
                assert_eq!(smtp.port, 587);
                assert_eq!(smtp.tls, TlsMode::StartTls);
                assert!(smtp.credentials.is_none());
            }
            RelaySettings::Log => panic!("expected smtp relay"),
        }
    }

    #[test]
    fn recipient_is_required() {
        let mut pairs = base();
        pairs.retain(|(k, _)| *k != "CONTACT_RECIPIENT");
        let err = AppConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CONTACT_RECIPIENT")));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = base();
        pairs.retain(|(k, _)| *k != "SMTP_HOST");
        pairs.push(("SMTP_HOST", "  "));
        let err = AppConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SMTP_HOST")));
    }

    #[test]
    fn log_relay_needs_no_smtp_host() {
        let config = AppConfig::from_vars(&vars(&[
            ("CONTACT_RECIPIENT", "owner@example.com"),
            ("CONTACT_SENDER", "no-reply@example.com"),
            ("MAIL_RELAY", "log"),
        ]))
        .unwrap();
        assert!(matches!(config.relay, RelaySettings::Log));
    }

    #[test]
    fn tls_mode_picks_port() {
        let mut pairs = base();
        pairs.push(("SMTP_TLS", "tls"));
        let config = AppConfig::from_vars(&vars(&pairs)).unwrap();
        match config.relay {
            RelaySettings::Smtp(smtp) => assert_eq!(smtp.port, 465),
            RelaySettings::Log => panic!("expected smtp relay"),
        }
    }

    #[test]
    fn half_credentials_are_rejected() {
        let mut pairs = base();
        pairs.push(("SMTP_USERNAME", "user"));
        let err = AppConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "SMTP_USERNAME", .. }));
    }

    #[test]
    fn bad_recipient_is_rejected() {
        let mut pairs = base();
        pairs.retain(|(k, _)| *k != "CONTACT_RECIPIENT");
        pairs.push(("CONTACT_RECIPIENT", "not an address"));
        let err = AppConfig::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CONTACT_RECIPIENT", .. }));
    }

    #[test]
    fn allowed_origin_is_parsed() {
        let mut pairs = base();
        pairs.push(("ALLOWED_ORIGIN", "https://example.com"));
        let config = AppConfig::from_vars(&vars(&pairs)).unwrap();
        assert_eq!(config.allowed_origin.unwrap(), "https://example.com");
    }
}
