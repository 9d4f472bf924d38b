//! Notification step: delivers the answer on each requested channel.
//!
//! Delivery is best-effort. Each channel runs inside its own task so that a
//! failing or panicking sender cannot affect the other channel or the run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::StepError;
use crate::notify::{DEFAULT_SUBJECT, EmailSender, MessageSender};
use crate::pipeline::record::{Field, Record};
use crate::pipeline::step::Step;

pub struct NotifyStep {
    email: Arc<dyn EmailSender>,
    messenger: Arc<dyn MessageSender>,
    subject: String,
}

impl NotifyStep {
    pub fn new(email: Arc<dyn EmailSender>, messenger: Arc<dyn MessageSender>) -> Self {
        Self {
            email,
            messenger,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    async fn send_email(&self, body: &str) -> bool {
        let sender = Arc::clone(&self.email);
        let body = body.to_string();
        let subject = self.subject.clone();
        tokio::spawn(async move { sender.send(&body, &subject).await })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Email sender task failed");
                false
            })
    }

    async fn send_message(&self, body: &str) -> bool {
        let sender = Arc::clone(&self.messenger);
        let body = body.to_string();
        tokio::spawn(async move { sender.send(&body).await })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "WhatsApp sender task failed");
                false
            })
    }
}

#[async_trait]
impl Step for NotifyStep {
    fn name(&self) -> &str {
        "notify"
    }

    fn reads(&self) -> &[Field] {
        &[Field::Answer, Field::SendEmailFlag, Field::SendWhatsappFlag]
    }

    fn writes(&self) -> &[Field] {
        &[]
    }

    async fn run(&self, record: &Record) -> Result<Record, StepError> {
        let body = record.answer.as_deref().unwrap_or_default();

        if record.send_email_flag.unwrap_or(false) {
            let sent = self.send_email(body).await;
            info!(sent, "Email delivery attempted");
        }

        if record.send_whatsapp_flag.unwrap_or(false) {
            let sent = self.send_message(body).await;
            info!(sent, "WhatsApp delivery attempted");
        }

        Ok(Record::new())
    }
}
