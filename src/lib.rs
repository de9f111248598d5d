//! Execution Notify - Workflow Execution Notifications
//!
//! This library reports workflow execution outcomes to people.
//! It includes:
//! - Notification context building (duration, deep link, first failed task run)
//! - Custom field and custom message overrides
//! - Template rendering with bundled Telegram and mail templates
//! - Telegram Bot API and SMTP delivery channels
//! - Settings loading

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use execution_notify_core::{
    Execution, NotifyError, NotifyResult, ProxyConfig, ProxyProtocol, State, StateType, TaskRun,
};
pub use models::settings::NotifySettings;
pub use services::notification::{
    ChannelConfig, ChannelType, DeliveryResult, InvocationState, MailConfig, MailExecution,
    NotificationService, NotificationTask, Overrides, PipelineStage, TaskFailure, TelegramConfig,
    TelegramExecution, TemplateRegistry, TransportStrategy,
};
pub use storage::ConfigService;
