//! SMTP delivery of cycle reports

use super::ReportSink;
use crate::config::EmailSettings;
use crate::{Error, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

/// Sends each report as a plain-text email over STARTTLS
pub struct EmailReporter {
    sender: Mailbox,
    recipient: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailReporter {
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let sender: Mailbox = settings
            .sender
            .parse()
            .map_err(|e| Error::Config(format!("Invalid sender address: {}", e)))?;
        let recipient: Mailbox = settings
            .recipient
            .parse()
            .map_err(|e| Error::Config(format!("Invalid recipient address: {}", e)))?;

        let credentials = Credentials::new(
            settings.sender.clone(),
            settings.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .map_err(|e| Error::Config(format!("Invalid SMTP host: {}", e)))?
            .port(settings.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            sender,
            recipient,
            mailer,
        })
    }

    fn message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Report(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl ReportSink for EmailReporter {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        tracing::info!(%subject, "{}", body);
        let message = self.message(subject, body)?;
        let response = self
            .mailer
            .send(message)
            .await
            .map_err(|e| Error::Report(e.to_string()))?;
        tracing::info!(code = %response.code(), "Email sent");
        Ok(())
    }
}
