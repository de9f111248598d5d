//! Notification Core Types
//!
//! Channel configuration, delivery results and pipeline bookkeeping types.
//! Channel configs support serde so hosts can keep them in flow definitions;
//! credentials are resolved by the host and never serialized back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use execution_notify_core::NotifyError;

/// Supported notification channel types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Telegram,
    Mail,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Telegram => write!(f, "telegram"),
            Self::Mail => write!(f, "mail"),
        }
    }
}

impl ChannelType {
    /// Id of the bundled template used when a channel config names none.
    pub fn default_template_id(&self) -> &'static str {
        match self {
            Self::Telegram => "telegram-template",
            Self::Mail => "mail-template",
        }
    }
}

/// Telegram bot configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token, format `6090305634:xyz`
    #[serde(skip_serializing, default)]
    pub token: String,
    /// Target chat or channel id
    pub chat_id: String,
    /// Bot API endpoint, falls back to the settings value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Send silently
    #[serde(default)]
    pub disable_notification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("endpoint", &self.endpoint)
            .field("disable_notification", &self.disable_notification)
            .field("template", &self.template)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// SMTP connection security
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportStrategy {
    /// Plain SMTP, no TLS
    Smtp,
    /// Implicit TLS (usually port 465)
    #[default]
    Smtps,
    /// STARTTLS upgrade (usually port 587)
    SmtpTls,
}

/// Mail relay configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub from: String,
    /// Comma separated recipients
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout_ms: Option<u64>,
    #[serde(default)]
    pub transport_strategy: TransportStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .field("to", &self.to)
            .field("cc", &self.cc)
            .field("subject", &self.subject)
            .field("session_timeout_ms", &self.session_timeout_ms)
            .field("transport_strategy", &self.transport_strategy)
            .field("template", &self.template)
            .finish()
    }
}

/// Channel configuration, exactly one variant per task instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelConfig {
    Telegram(TelegramConfig),
    Mail(MailConfig),
}

impl ChannelConfig {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            Self::Telegram(_) => ChannelType::Telegram,
            Self::Mail(_) => ChannelType::Mail,
        }
    }

    /// Template id configured for this channel, or the bundled default.
    pub fn template_id(&self) -> &str {
        let configured = match self {
            Self::Telegram(cfg) => cfg.template.as_deref(),
            Self::Mail(cfg) => cfg.template.as_deref(),
        };
        configured.unwrap_or_else(|| self.channel_type().default_template_id())
    }

    /// Delivery timeout set on the channel itself, if any.
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Telegram(cfg) => cfg.timeout_ms,
            Self::Mail(cfg) => cfg.session_timeout_ms,
        }
    }
}

/// Acknowledgment of a successful delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub id: String,
    pub channel: ChannelType,
    /// Channel-specific acknowledgment (message id, SMTP response)
    pub acknowledgment: String,
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryResult {
    pub fn new(channel: ChannelType, acknowledgment: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel,
            acknowledgment: acknowledgment.into(),
            delivered_at: Utc::now(),
        }
    }
}

/// Stage of a notification invocation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Build,
    Override,
    Render,
    Deliver,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Override => write!(f, "override"),
            Self::Render => write!(f, "render"),
            Self::Deliver => write!(f, "deliver"),
        }
    }
}

/// Progress of one invocation: `Built -> Overridden -> Rendered -> Delivered | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Pending,
    Built,
    Overridden,
    Rendered,
    Delivered,
    Failed(PipelineStage),
}

impl InvocationState {
    /// Stage that runs next from this state, `None` once terminal.
    pub fn next_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Pending => Some(PipelineStage::Build),
            Self::Built => Some(PipelineStage::Override),
            Self::Overridden => Some(PipelineStage::Render),
            Self::Rendered => Some(PipelineStage::Deliver),
            Self::Delivered | Self::Failed(_) => None,
        }
    }

    /// State reached after `stage` completes successfully.
    pub fn completed(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Build => Self::Built,
            PipelineStage::Override => Self::Overridden,
            PipelineStage::Render => Self::Rendered,
            PipelineStage::Deliver => Self::Delivered,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed(_))
    }
}

/// Failure of a notification task, carrying the stage that halted it
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct TaskFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: NotifyError,
}

impl TaskFailure {
    pub fn new(stage: PipelineStage, error: NotifyError) -> Self {
        Self { stage, error }
    }

    /// Whether the calling scheduler may retry the whole task.
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}
