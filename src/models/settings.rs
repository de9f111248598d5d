//! Settings Models
//!
//! Host-level settings for the notification pipeline.

use serde::{Deserialize, Serialize};

use execution_notify_core::ProxyConfig;

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_ENDPOINT: &str = "https://api.telegram.org";

/// Notification settings stored in notify.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Base URL of the workflow UI, used to build execution deep links
    #[serde(default)]
    pub base_url: Option<String>,
    /// Telegram Bot API endpoint
    #[serde(default = "default_telegram_endpoint")]
    pub telegram_endpoint: String,
    /// Delivery timeout applied when a channel does not set its own
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Optional proxy for HTTP-based channels
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

fn default_telegram_endpoint() -> String {
    DEFAULT_TELEGRAM_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            telegram_endpoint: default_telegram_endpoint(),
            default_timeout_ms: default_timeout_ms(),
            proxy: None,
        }
    }
}

impl NotifySettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if let Some(base_url) = &self.base_url {
            let parsed = url::Url::parse(base_url)
                .map_err(|e| format!("Invalid base_url '{}': {}", base_url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("base_url must be http(s): {}", base_url));
            }
        }

        url::Url::parse(&self.telegram_endpoint).map_err(|e| {
            format!(
                "Invalid telegram_endpoint '{}': {}",
                self.telegram_endpoint, e
            )
        })?;

        if self.default_timeout_ms == 0 {
            return Err("default_timeout_ms must be greater than 0".to_string());
        }

        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }

        Ok(())
    }
}
