//! Best-effort notification delivery.
//!
//! Senders never fail past their own boundary: every error, including a
//! missing configuration, becomes a `false` result and a log line.

pub mod email;
pub mod whatsapp;

pub use email::{EmailConfig, SmtpEmailSender};
pub use whatsapp::{TwilioConfig, TwilioSender};

use async_trait::async_trait;

/// Subject used when the caller does not supply one.
pub const DEFAULT_SUBJECT: &str = "🌦️ Your AI Weather Agent Update";

/// Delivers a message body by email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Returns `true` only when the message was accepted for delivery.
    async fn send(&self, body: &str, subject: &str) -> bool;
}

/// Delivers a message body over a chat/SMS channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Returns `true` only when the message was accepted for delivery.
    async fn send(&self, body: &str) -> bool;
}
