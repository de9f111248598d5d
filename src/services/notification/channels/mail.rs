//! Mail Notification Channel
//!
//! Builds a message from the mail config and the rendered body, then sends it
//! through one SMTP session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Mailboxes};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use execution_notify_core::{NotifyError, NotifyResult};

use super::{mismatched_config, with_timeout, NotificationChannel};
use crate::services::notification::template::{RenderedMessage, TemplateFormat};
use crate::services::notification::types::{
    ChannelConfig, ChannelType, DeliveryResult, MailConfig, TransportStrategy,
};

/// Low-level mail relay client. Returns the relay's acceptance response.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        config: &MailConfig,
        message: Message,
        timeout: Duration,
    ) -> NotifyResult<String>;
}

/// SMTP relay client over lettre's tokio transport.
#[derive(Debug, Default)]
pub struct SmtpMailTransport;

impl SmtpMailTransport {
    fn build_transport(
        config: &MailConfig,
        timeout: Duration,
    ) -> NotifyResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = match config.transport_strategy {
            TransportStrategy::Smtp => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
            TransportStrategy::Smtps => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(classify_smtp_error)?,
            TransportStrategy::SmtpTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(classify_smtp_error)?
            }
        };

        let mut builder = builder.port(config.port).timeout(Some(timeout));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(
        &self,
        config: &MailConfig,
        message: Message,
        timeout: Duration,
    ) -> NotifyResult<String> {
        let mailer = Self::build_transport(config, timeout)?;
        let response = mailer.send(message).await.map_err(classify_smtp_error)?;
        Ok(format!(
            "{} {}",
            response.code(),
            response
                .message()
                .collect::<Vec<_>>()
                .join(" ")
        ))
    }
}

/// Map an SMTP failure onto the notification error taxonomy.
fn classify_smtp_error(err: lettre::transport::smtp::Error) -> NotifyError {
    if err.is_timeout() {
        return NotifyError::transport("SMTP session timed out");
    }
    if let Some(code) = err.status() {
        match code.to_string().as_str() {
            "530" | "534" | "535" => {
                return NotifyError::auth(format!("SMTP relay rejected credentials: {}", err))
            }
            "550" | "551" | "553" => {
                return NotifyError::target(format!("SMTP relay rejected recipient: {}", err))
            }
            _ => {}
        }
    }
    NotifyError::transport(format!("SMTP error: {}", err))
}

/// Build the outgoing message. HTML bodies are sent as `text/html`,
/// everything else as `text/plain`.
pub fn build_message(config: &MailConfig, message: &RenderedMessage) -> NotifyResult<Message> {
    let from: Mailbox = config
        .from
        .parse()
        .map_err(|e| NotifyError::config(format!("invalid sender '{}': {}", config.from, e)))?;
    let to: Mailboxes = config
        .to
        .parse()
        .map_err(|e| NotifyError::target(format!("invalid recipients '{}': {}", config.to, e)))?;

    let mut builder = Message::builder().from(from).subject(config.subject.clone());

    let mut recipients = 0;
    for mailbox in to {
        builder = builder.to(mailbox);
        recipients += 1;
    }
    if recipients == 0 {
        return Err(NotifyError::target("no mail recipients configured"));
    }

    if let Some(cc) = config.cc.as_deref().filter(|cc| !cc.trim().is_empty()) {
        let cc: Mailboxes = cc
            .parse()
            .map_err(|e| NotifyError::target(format!("invalid cc '{}': {}", cc, e)))?;
        for mailbox in cc {
            builder = builder.cc(mailbox);
        }
    }

    let content_type = match message.format {
        TemplateFormat::Html => ContentType::TEXT_HTML,
        TemplateFormat::MarkdownV2 | TemplateFormat::Plain => ContentType::TEXT_PLAIN,
    };

    builder
        .header(content_type)
        .body(message.body.clone())
        .map_err(|e| NotifyError::config(format!("failed to build mail message: {}", e)))
}

/// Mail channel: one SMTP session per delivery.
pub struct MailChannel {
    transport: Arc<dyn MailTransport>,
}

impl MailChannel {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl NotificationChannel for MailChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Mail
    }

    async fn deliver(
        &self,
        config: &ChannelConfig,
        message: &RenderedMessage,
        timeout: Duration,
    ) -> NotifyResult<DeliveryResult> {
        let cfg = match config {
            ChannelConfig::Mail(cfg) => cfg,
            other => return Err(mismatched_config(ChannelType::Mail, other)),
        };

        let mail = build_message(cfg, message)?;

        tracing::debug!(
            host = %cfg.host,
            port = cfg.port,
            strategy = ?cfg.transport_strategy,
            recipients = mail.envelope().to().len(),
            "Sending mail"
        );

        let ack = with_timeout(
            ChannelType::Mail,
            timeout,
            self.transport.send(cfg, mail, timeout),
        )
        .await?;

        Ok(DeliveryResult::new(ChannelType::Mail, ack))
    }
}
