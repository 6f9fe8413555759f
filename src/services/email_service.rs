use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client as SesClient,
    types::{Body, Content, Destination, EmailContent, Message},
};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    OrderConfirmation,
    AdminOrderAlert,
    StatusUpdate,
}

impl EmailKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailKind::OrderConfirmation => "order_confirmation",
            EmailKind::AdminOrderAlert => "admin_order_alert",
            EmailKind::StatusUpdate => "status_update",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers one rendered email. Retrying is the caller's job.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

pub struct SesMailer {
    client: SesClient,
    sender: String,
}

impl SesMailer {
    pub fn new(client: SesClient, sender: String) -> Self {
        Self { client, sender }
    }
}

fn utf8_content(data: impl Into<String>) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to build email content: {}", e)))
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let destination = Destination::builder()
            .to_addresses(&message.to)
            .build();

        let body = Body::builder()
            .html(utf8_content(message.html.as_str())?)
            .build();

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(utf8_content(message.subject.as_str())?)
                    .body(body)
                    .build(),
            )
            .build();

        self.client
            .send_email()
            .from_email_address(&self.sender)
            .destination(destination)
            .content(content)
            .send()
            .await
            .map_err(|e| {
                AppError::InternalError(format!("SES rejected {}: {:?}", message.kind.as_str(), e))
            })?;

        Ok(())
    }
}

/// Used when `EMAIL_ENABLED=false`: records what would have been sent.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            "Email disabled, skipping {} to {}: {}",
            message.kind.as_str(),
            message.to,
            message.subject
        );
        Ok(())
    }
}
