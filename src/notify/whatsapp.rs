//! WhatsApp/SMS delivery through the Twilio Messages API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::MessageSender;
use crate::error::NotifyError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Twilio truncates bodies beyond this many characters.
const TWILIO_MAX_BODY_CHARS: usize = 1600;

/// Twilio credentials and numbers, built from environment variables.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Sender, e.g. `whatsapp:+14155238886` for the WhatsApp sandbox.
    pub from: String,
    /// Recipient, e.g. `whatsapp:+15551234567`.
    pub to: String,
    pub api_base: String,
}

impl TwilioConfig {
    /// Returns `None` unless `TWILIO_SID`, `TWILIO_AUTH`, `TWILIO_FROM` and
    /// `TWILIO_TO` are all set (channel disabled).
    pub fn from_vars<F>(var: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|s| !s.trim().is_empty());

        Some(Self {
            account_sid: non_empty("TWILIO_SID")?,
            auth_token: SecretString::from(non_empty("TWILIO_AUTH")?),
            from: non_empty("TWILIO_FROM")?,
            to: non_empty("TWILIO_TO")?,
            api_base: non_empty("TWILIO_API_BASE").unwrap_or_else(|| TWILIO_API_BASE.into()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Sends the answer as a WhatsApp (or plain SMS) message via Twilio.
pub struct TwilioSender {
    config: Option<TwilioConfig>,
    client: reqwest::Client,
}

impl TwilioSender {
    pub fn new(config: Option<TwilioConfig>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn try_send(&self, body: &str) -> Result<String, NotifyError> {
        let config = self.config.as_ref().ok_or_else(|| NotifyError::NotConfigured {
            channel: "twilio".into(),
        })?;

        let text = truncate_body(body, TWILIO_MAX_BODY_CHARS);
        let form = [
            ("From", config.from.as_str()),
            ("To", config.to.as_str()),
            ("Body", text.as_str()),
        ];

        let resp = self
            .client
            .post(config.messages_url())
            .basic_auth(&config.account_sid, Some(config.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::SendFailed {
                channel: "twilio".into(),
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                channel: "twilio".into(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(config.to.clone())
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, body: &str) -> bool {
        match self.try_send(body).await {
            Ok(recipient) => {
                info!(%recipient, "📱 WhatsApp/SMS sent");
                true
            }
            Err(NotifyError::NotConfigured { .. }) => {
                info!("Twilio not configured. Skipping WhatsApp/SMS.");
                false
            }
            Err(e) => {
                warn!(error = %e, "Twilio error");
                false
            }
        }
    }
}

/// Cut a body to at most `max_chars` characters, ending in an ellipsis when cut.
fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
