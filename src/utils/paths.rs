//! Path Utilities
//!
//! Resolves the default location of the settings file.

use std::path::PathBuf;

use execution_notify_core::{NotifyError, NotifyResult};

/// Environment variable that overrides the settings file location
pub const SETTINGS_PATH_ENV: &str = "EXECUTION_NOTIFY_CONFIG";

/// Get the user's home directory
pub fn home_dir() -> NotifyResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| NotifyError::config("Could not determine home directory"))
}

/// Get the settings file path.
///
/// `$EXECUTION_NOTIFY_CONFIG` when set, else `~/.execution-notify/notify.json`.
pub fn settings_path() -> NotifyResult<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(home_dir()?.join(".execution-notify").join("notify.json"))
}
