//! JSON Configuration Management
//!
//! Loads notification settings from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use execution_notify_core::{NotifyError, NotifyResult};

use crate::models::settings::NotifySettings;
use crate::utils::paths::settings_path;

/// Configuration service for notification settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: NotifySettings,
}

impl ConfigService {
    /// Load settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> NotifyResult<Self> {
        let config_path = path.as_ref().to_path_buf();
        let settings = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Settings file not found, using defaults"
            );
            let defaults = NotifySettings::default();
            defaults.validate().map_err(NotifyError::config)?;
            defaults
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load settings from the default location (see [`settings_path`]).
    pub fn load_default() -> NotifyResult<Self> {
        Self::load(settings_path()?)
    }

    /// Load settings from a file
    fn load_from_file(path: &Path) -> NotifyResult<NotifySettings> {
        let content = fs::read_to_string(path)?;
        let settings: NotifySettings = serde_json::from_str(&content)?;
        settings.validate().map_err(NotifyError::config)?;
        Ok(settings)
    }

    /// Get the current settings
    pub fn settings(&self) -> &NotifySettings {
        &self.settings
    }

    /// Reload settings from disk. On failure the previous settings are kept.
    pub fn reload(&mut self) -> NotifyResult<()> {
        self.settings = Self::load_from_file(&self.config_path)?;
        Ok(())
    }
}
