//! Execution Notification Tasks
//!
//! Host-facing task types. Each one pairs a channel config with the user
//! overrides and exposes a single `run` that notifies about one execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use execution_notify_core::Execution;

use super::overrides::Overrides;
use super::service::NotificationService;
use super::types::{ChannelConfig, DeliveryResult, MailConfig, TaskFailure, TelegramConfig};

/// A task the workflow engine runs when an execution should be reported.
#[async_trait]
pub trait NotificationTask: Send + Sync {
    /// Channel configuration this task delivers through.
    fn channel_config(&self) -> ChannelConfig;

    fn overrides(&self) -> &Overrides;

    /// Notify about `execution`. One delivery attempt, no retry.
    async fn run(
        &self,
        service: &NotificationService,
        execution: &Execution,
    ) -> Result<DeliveryResult, TaskFailure> {
        service
            .dispatch(&self.channel_config(), execution, self.overrides())
            .await
    }
}

/// Send a Telegram message with the execution information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramExecution {
    #[serde(flatten)]
    pub config: TelegramConfig,
    #[serde(flatten)]
    pub overrides: Overrides,
}

#[async_trait]
impl NotificationTask for TelegramExecution {
    fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::Telegram(self.config.clone())
    }

    fn overrides(&self) -> &Overrides {
        &self.overrides
    }
}

/// Send a mail with the execution information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailExecution {
    #[serde(flatten)]
    pub config: MailConfig,
    #[serde(flatten)]
    pub overrides: Overrides,
}

#[async_trait]
impl NotificationTask for MailExecution {
    fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::Mail(self.config.clone())
    }

    fn overrides(&self) -> &Overrides {
        &self.overrides
    }
}
