//! Notification Error Types
//!
//! Error taxonomy shared by every stage of the notification pipeline.
//! Only transport faults are retryable; everything else is an input or
//! configuration problem that needs a change before another attempt.

use thiserror::Error;

/// Error raised by any stage of a notification invocation.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The execution record is malformed (empty id, missing state)
    #[error("Invalid execution: {0}")]
    InvalidExecution(String),

    /// No template is registered under the requested id
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// A template references a field absent from the render context
    #[error("Unresolved field: {0}")]
    UnresolvedField(String),

    /// The template source could not be parsed
    #[error("Template syntax error: {0}")]
    TemplateSyntax(String),

    /// The channel rejected the configured credentials
    #[error("Channel authentication failed: {0}")]
    ChannelAuth(String),

    /// The channel rejected the destination (chat id, recipient)
    #[error("Channel target rejected: {0}")]
    ChannelTarget(String),

    /// Network, timeout or protocol failure while talking to the channel
    #[error("Channel transport error: {0}")]
    ChannelTransport(String),

    /// Invalid settings or channel configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for notification errors
pub type NotifyResult<T> = Result<T, NotifyError>;

impl NotifyError {
    /// Create an invalid execution error
    pub fn invalid_execution(msg: impl Into<String>) -> Self {
        Self::InvalidExecution(msg.into())
    }

    /// Create a template not found error
    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::TemplateNotFound(id.into())
    }

    /// Create an unresolved field error
    pub fn unresolved_field(path: impl Into<String>) -> Self {
        Self::UnresolvedField(path.into())
    }

    /// Create a template syntax error
    pub fn template_syntax(msg: impl Into<String>) -> Self {
        Self::TemplateSyntax(msg.into())
    }

    /// Create a channel authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::ChannelAuth(msg.into())
    }

    /// Create a channel target error
    pub fn target(msg: impl Into<String>) -> Self {
        Self::ChannelTarget(msg.into())
    }

    /// Create a channel transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::ChannelTransport(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the calling scheduler may retry the whole task.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChannelTransport(_))
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidExecution(_) => "invalid_execution",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::UnresolvedField(_) => "unresolved_field",
            Self::TemplateSyntax(_) => "template_syntax",
            Self::ChannelAuth(_) => "channel_auth",
            Self::ChannelTarget(_) => "channel_target",
            Self::ChannelTransport(_) => "channel_transport",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
