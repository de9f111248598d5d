//! Execution Notifications
//!
//! Turns a finished (or running) workflow execution into a human-readable
//! notification and delivers it over Telegram or mail.
//!
//! An invocation runs in four stages:
//! 1. build the [`context::NotificationContext`] from the execution
//! 2. apply user overrides (custom fields, custom message)
//! 3. render the message through a named template or the literal message
//! 4. deliver through the channel selected by the [`types::ChannelConfig`]

pub mod channels;
pub mod context;
pub mod overrides;
pub mod service;
pub mod tasks;
pub mod template;
pub mod types;

pub use channels::{MailChannel, NotificationChannel, TelegramChannel};
pub use context::{ContextBuilder, FirstFailed, NotificationContext};
pub use overrides::{Overrides, RenderPlan};
pub use service::NotificationService;
pub use tasks::{MailExecution, NotificationTask, TelegramExecution};
pub use template::{RenderedMessage, Template, TemplateFormat, TemplateRegistry, TemplateRenderer};
pub use types::*;
