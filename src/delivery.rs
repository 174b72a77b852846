//! Digest delivery over authenticated SMTP.
//!
//! One call to [`DigestMailer::send`] opens one SMTP session (STARTTLS,
//! then login, then submit) and makes exactly one delivery attempt. Nothing
//! is queued or retried.

use crate::config::{MailConfig, configured_value};
use crate::models::DigestMessage;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Why a digest could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email credentials not configured")]
    NotConfigured,
    #[error("invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Anything that can deliver a composed digest to one recipient.
#[allow(async_fn_in_trait)]
pub trait DigestSender {
    /// Deliver `message` and return the acknowledgment text.
    async fn send(
        &self,
        message: &DigestMessage,
        recipient: &str,
    ) -> Result<String, DeliveryError>;
}

/// Sends digests through an SMTP submission server.
#[derive(Debug, Clone)]
pub struct DigestMailer {
    config: MailConfig,
}

impl DigestMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Sender login and password, if both are set.
    fn credentials(&self) -> Option<(&str, &str)> {
        let user = configured_value(self.config.username.as_deref())?;
        let password = configured_value(self.config.password.as_deref())?;
        Some((user, password))
    }

    /// Whether sending can be attempted at all.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Assemble the MIME message: multipart/mixed with one plain-text part.
fn build_message(from: &str, to: &str, digest: &DigestMessage) -> Result<Message, DeliveryError> {
    Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(to)?)
        .subject(digest.subject.as_str())
        .multipart(MultiPart::mixed().singlepart(SinglePart::plain(digest.body.clone())))
        .map_err(|e| DeliveryError::Build(e.to_string()))
}

impl DigestSender for DigestMailer {
    #[instrument(level = "info", skip_all, fields(host = %self.config.host, port = self.config.port))]
    async fn send(
        &self,
        message: &DigestMessage,
        recipient: &str,
    ) -> Result<String, DeliveryError> {
        let Some((user, password)) = self.credentials() else {
            warn!("Email credentials not configured; skipping delivery");
            return Err(DeliveryError::NotConfigured);
        };

        let email = build_message(user, recipient, message)?;

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?
                .port(self.config.port)
                .credentials(Credentials::new(user.to_string(), password.to_string()))
                .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
                .build();

        let response = mailer
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        info!(
            to = %recipient,
            subject = %message.subject,
            code = %response.code(),
            "Email sent successfully"
        );
        Ok(format!("Email sent successfully! (server replied {})", response.code()))
    }
}
