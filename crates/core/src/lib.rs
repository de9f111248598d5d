//! Execution Notify Core
//!
//! Data model and error types shared by the notification pipeline. This crate
//! has no dependency on transports (HTTP, SMTP) or on the template layer.
//!
//! ## Module Organization
//!
//! - `error` - Notification error taxonomy (`NotifyError`, `NotifyResult`)
//! - `execution` - Execution snapshot supplied by the workflow engine (`Execution`, `TaskRun`, `State`)
//! - `proxy` - Proxy configuration data types used by HTTP-based channels

pub mod error;
pub mod execution;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{NotifyError, NotifyResult};

// ── Execution Model ────────────────────────────────────────────────────
pub use execution::{Execution, State, StateType, TaskRun};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
