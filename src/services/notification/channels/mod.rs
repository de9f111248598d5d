//! Notification Channel Trait
//!
//! Defines the async trait every delivery channel implements, plus channel
//! module exports. A channel performs exactly one delivery attempt per call.

pub mod mail;
pub mod telegram;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use execution_notify_core::{NotifyError, NotifyResult};

use super::template::RenderedMessage;
use super::types::{ChannelConfig, ChannelType, DeliveryResult};

pub use mail::{MailChannel, MailTransport, SmtpMailTransport};
pub use telegram::{HttpTelegramApi, TelegramApi, TelegramChannel};

/// Async trait for notification channel implementations.
///
/// Channels receive the already rendered message and the channel config of
/// their own variant; a config of another variant is a configuration error.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel type identifier.
    fn channel_type(&self) -> ChannelType;

    /// Deliver a rendered message. No internal retry.
    async fn deliver(
        &self,
        config: &ChannelConfig,
        message: &RenderedMessage,
        timeout: Duration,
    ) -> NotifyResult<DeliveryResult>;
}

/// Run a delivery future, failing with a transport error once `timeout` elapses.
pub(crate) async fn with_timeout<F, T>(channel: ChannelType, timeout: Duration, fut: F) -> NotifyResult<T>
where
    F: Future<Output = NotifyResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::transport(format!(
            "{} delivery timed out after {}ms",
            channel,
            timeout.as_millis()
        ))),
    }
}

pub(crate) fn mismatched_config(expected: ChannelType, config: &ChannelConfig) -> NotifyError {
    NotifyError::config(format!(
        "{} channel received a {} config",
        expected,
        config.channel_type()
    ))
}
