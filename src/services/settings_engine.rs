// Tab host settings engine
// Loads, saves, updates and resets `TabsSettings`.
// Settings are stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::TabsSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<TabsSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &TabsSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: TabsSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("settings.json"));

        Self {
            config_path,
            settings: TabsSettings::default(),
        }
    }

    /// Debounce window for tab list persistence.
    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.settings.persist_debounce_ms)
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults. Missing keys in an existing file take
    /// their default values; a malformed file is an error.
    fn load(&mut self) -> Result<TabsSettings, SettingsError> {
        if !self.config_path.exists() {
            log::debug!(
                "No settings at {}, using defaults",
                self.config_path.display()
            );
            self.settings = TabsSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = serde_json::from_str(&content)?;
        log::info!("Loaded settings from {}", self.config_path.display());
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }

    fn get_settings(&self) -> &TabsSettings {
        &self.settings
    }

    /// Updates one top-level setting and saves to disk.
    ///
    /// The new value is validated by deserializing the whole settings object;
    /// on failure the in-memory settings are left untouched.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let mut json_value = serde_json::to_value(&self.settings)?;
        match json_value.get_mut(key) {
            Some(slot) => *slot = value,
            None => {
                return Err(SettingsError::InvalidKey(key.to_string()));
            }
        }

        self.settings = serde_json::from_value(json_value)?;
        self.save()
    }

    /// Resets all settings to factory defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = TabsSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
