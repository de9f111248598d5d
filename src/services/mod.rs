//! Services
//!
//! Notification pipeline and the HTTP plumbing its channels share.

pub mod http_client;
pub mod notification;

pub use http_client::build_http_client;
pub use notification::{
    MailExecution, NotificationService, NotificationTask, TelegramExecution,
};
