//! Email delivery over SMTP via lettre.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::EmailSender;
use crate::error::NotifyError;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 465;

// ── Configuration ───────────────────────────────────────────────────

/// SMTP configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub recipient: String,
}

impl EmailConfig {
    /// Build config from a variable source.
    /// Returns `None` unless `EMAIL_USER` and `EMAIL_PASS` are both set
    /// (channel disabled). `EMAIL_TO` defaults to the sender.
    pub fn from_vars<F>(var: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|s| !s.trim().is_empty());

        let username = non_empty("EMAIL_USER")?;
        let password = non_empty("EMAIL_PASS")?;
        let recipient = non_empty("EMAIL_TO").unwrap_or_else(|| username.clone());

        let smtp_host = non_empty("EMAIL_SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.into());
        let smtp_port: u16 = non_empty("EMAIL_SMTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: SecretString::from(password),
            recipient,
        })
    }
}

// ── Sender ──────────────────────────────────────────────────────────

/// Sends the answer to the configured recipient over implicit-TLS SMTP.
pub struct SmtpEmailSender {
    config: Option<EmailConfig>,
}

impl SmtpEmailSender {
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn try_send(&self, body: &str, subject: &str) -> Result<String, NotifyError> {
        let config = self.config.clone().ok_or_else(|| NotifyError::NotConfigured {
            channel: "email".into(),
        })?;
        let email = build_message(&config, subject, body)?;
        let recipient = config.recipient.clone();

        tokio::task::spawn_blocking(move || deliver(&config, &email))
            .await
            .map_err(|e| NotifyError::SendFailed {
                channel: "email".into(),
                reason: format!("SMTP task panicked: {e}"),
            })??;

        Ok(recipient)
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, body: &str, subject: &str) -> bool {
        match self.try_send(body, subject).await {
            Ok(recipient) => {
                info!(%recipient, "📧 Email sent");
                true
            }
            Err(NotifyError::NotConfigured { .. }) => {
                info!("Email not configured. Skipping email.");
                false
            }
            Err(e) => {
                warn!(error = %e, "Email error");
                false
            }
        }
    }
}

/// Build the outgoing message.
fn build_message(config: &EmailConfig, subject: &str, body: &str) -> Result<Message, NotifyError> {
    Message::builder()
        .from(config.username.parse().map_err(|e| NotifyError::SendFailed {
            channel: "email".into(),
            reason: format!("Invalid from address: {e}"),
        })?)
        .to(config.recipient.parse().map_err(|e| NotifyError::SendFailed {
            channel: "email".into(),
            reason: format!("Invalid to address: {e}"),
        })?)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| NotifyError::SendFailed {
            channel: "email".into(),
            reason: format!("Failed to build email: {e}"),
        })
}

/// Blocking SMTP delivery (run in spawn_blocking).
fn deliver(config: &EmailConfig, email: &Message) -> Result<(), NotifyError> {
    let creds = Credentials::new(
        config.username.clone(),
        config.password.expose_secret().to_string(),
    );

    let transport = SmtpTransport::relay(&config.smtp_host)
        .map_err(|e| NotifyError::SendFailed {
            channel: "email".into(),
            reason: format!("SMTP relay error: {e}"),
        })?
        .port(config.smtp_port)
        .credentials(creds)
        .build();

    transport.send(email).map_err(|e| NotifyError::SendFailed {
        channel: "email".into(),
        reason: format!("SMTP send failed: {e}"),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn config() -> EmailConfig {
        EmailConfig::from_vars(vars(&[
            ("EMAIL_USER", "agent@example.com"),
            ("EMAIL_PASS", "app-password"),
            ("EMAIL_TO", "me@example.com"),
        ]))
        .unwrap()
    }

    #[test]
    fn config_disabled_without_credentials() {
        assert!(EmailConfig::from_vars(vars(&[])).is_none());
        assert!(EmailConfig::from_vars(vars(&[("EMAIL_USER", "a@b.com")])).is_none());
        assert!(EmailConfig::from_vars(vars(&[("EMAIL_PASS", "secret")])).is_none());
    }

    #[test]
    fn config_recipient_defaults_to_sender() {
        let config = EmailConfig::from_vars(vars(&[
            ("EMAIL_USER", "agent@example.com"),
            ("EMAIL_PASS", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.recipient, "agent@example.com");
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 465);
    }

    #[test]
    fn config_custom_server() {
        let config = EmailConfig::from_vars(vars(&[
            ("EMAIL_USER", "agent@example.com"),
            ("EMAIL_PASS", "secret"),
            ("EMAIL_SMTP_HOST", "mail.example.com"),
            ("EMAIL_SMTP_PORT", "2465"),
        ]))
        .unwrap();
        assert_eq!(config.smtp_host, "mail.example.com");
        assert_eq!(config.smtp_port, 2465);
    }

    #[test]
    fn message_builds_for_valid_addresses() {
        assert!(build_message(&config(), "Subject", "Body").is_ok());
    }

    #[test]
    fn message_rejects_invalid_recipient() {
        let mut config = config();
        config.recipient = "not an address".into();
        let err = build_message(&config, "Subject", "Body").unwrap_err();
        assert!(err.to_string().contains("Invalid to address"));
    }

    #[tokio::test]
    async fn unconfigured_sender_returns_false() {
        let sender = SmtpEmailSender::new(None);
        assert!(!sender.is_configured());
        assert!(!sender.send("hello", "subject").await);
    }

    #[tokio::test]
    async fn invalid_address_returns_false_without_network() {
        let mut config = config();
        config.username = "broken".into();
        let sender = SmtpEmailSender::new(Some(config));
        assert!(!sender.send("hello", "subject").await);
    }
}
