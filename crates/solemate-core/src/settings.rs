//! User-facing app settings.
//!
//! Eight on/off toggles persisted as `settings.json` in the data directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Errors from settings persistence.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),

    /// No toggle has this name.
    #[error("Unknown setting: '{0}'")]
    UnknownKey(String),
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Names a single toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    /// Push notifications.
    Notifications,
    /// Vibration cues from the shoe.
    Vibration,
    /// Spoken guidance.
    VoiceGuidance,
    /// Reconnect to the last shoe on launch.
    AutoConnect,
    /// Share location with emergency contacts.
    LocationSharing,
    /// Alert contacts when an emergency is raised.
    EmergencyAlerts,
    /// Dark theme.
    DarkMode,
    /// High-contrast theme.
    HighContrast,
}

impl SettingKey {
    /// Every key, in panel order.
    pub const ALL: [Self; 8] = [
        Self::Notifications,
        Self::Vibration,
        Self::VoiceGuidance,
        Self::AutoConnect,
        Self::LocationSharing,
        Self::EmergencyAlerts,
        Self::DarkMode,
        Self::HighContrast,
    ];

    /// The snake_case name used in JSON and routes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notifications => "notifications",
            Self::Vibration => "vibration",
            Self::VoiceGuidance => "voice_guidance",
            Self::AutoConnect => "auto_connect",
            Self::LocationSharing => "location_sharing",
            Self::EmergencyAlerts => "emergency_alerts",
            Self::DarkMode => "dark_mode",
            Self::HighContrast => "high_contrast",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

/// The settings panel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Push notifications.
    pub notifications: bool,
    /// Vibration cues from the shoe.
    pub vibration: bool,
    /// Spoken guidance.
    pub voice_guidance: bool,
    /// Reconnect to the last shoe on launch.
    pub auto_connect: bool,
    /// Share location with emergency contacts.
    pub location_sharing: bool,
    /// Alert contacts when an emergency is raised.
    pub emergency_alerts: bool,
    /// Dark theme.
    pub dark_mode: bool,
    /// High-contrast theme.
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications: true,
            vibration: true,
            voice_guidance: true,
            auto_connect: false,
            location_sharing: true,
            emergency_alerts: true,
            dark_mode: false,
            high_contrast: false,
        }
    }
}

impl Settings {
    /// Current value of `key`.
    #[must_use]
    pub const fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Notifications => self.notifications,
            SettingKey::Vibration => self.vibration,
            SettingKey::VoiceGuidance => self.voice_guidance,
            SettingKey::AutoConnect => self.auto_connect,
            SettingKey::LocationSharing => self.location_sharing,
            SettingKey::EmergencyAlerts => self.emergency_alerts,
            SettingKey::DarkMode => self.dark_mode,
            SettingKey::HighContrast => self.high_contrast,
        }
    }

    fn slot(&mut self, key: SettingKey) -> &mut bool {
        match key {
            SettingKey::Notifications => &mut self.notifications,
            SettingKey::Vibration => &mut self.vibration,
            SettingKey::VoiceGuidance => &mut self.voice_guidance,
            SettingKey::AutoConnect => &mut self.auto_connect,
            SettingKey::LocationSharing => &mut self.location_sharing,
            SettingKey::EmergencyAlerts => &mut self.emergency_alerts,
            SettingKey::DarkMode => &mut self.dark_mode,
            SettingKey::HighContrast => &mut self.high_contrast,
        }
    }

    /// Flips `key` and returns its new value.
    pub fn toggle(&mut self, key: SettingKey) -> bool {
        let slot = self.slot(key);
        *slot = !*slot;
        *slot
    }

    /// Restores the defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Loads and saves [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, or the defaults if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> SettingsResult<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| SettingsError::ReadError {
                path: self.path.clone(),
                source,
            })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes `settings`, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::WriteError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content).map_err(|source| SettingsError::WriteError {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
