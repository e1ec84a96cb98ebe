//! Unified error type for the SoleMate core library.
//!
//! Each module has its own error enum ([`AuthError`], [`ValidationError`],
//! [`ConfigError`](crate::config::ConfigError), [`BluetoothError`](crate::bluetooth::BluetoothError),
//! and so on). [`SoleMateError`] folds them into one type that carries an
//! HTTP status and a stable error code, so the server can map any failure to
//! a response without knowing which module produced it.
//!
//! # Example
//!
//! ```rust
//! use solemate_core::error::{Result, SoleMateError};
//! use solemate_core::settings::SettingKey;
//!
//! fn parse_key(name: &str) -> Result<SettingKey> {
//!     Ok(name.parse::<SettingKey>()?)
//! }
//!
//! let err = parse_key("wifi").unwrap_err();
//! assert_eq!(err.error_code(), "UNKNOWN_SETTING");
//! assert_eq!(err.http_status_code(), 404);
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::account::{AccountError, ValidationError};
use crate::identity::AuthError;

/// The unified error type for all SoleMate operations.
#[derive(Debug, Error)]
pub enum SoleMateError {
    // =========================================================================
    // ACCOUNT ERRORS
    // =========================================================================
    /// The identity provider rejected an action.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Account input was rejected before reaching the provider.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session watcher already holds a subscription.
    #[error("Session watcher is already active")]
    WatcherAlreadyActive,

    /// The principal id cannot be used as a profile key.
    #[error("Invalid profile id: '{0}'")]
    InvalidProfileId(String),

    // =========================================================================
    // DEVICE ERRORS
    // =========================================================================
    /// Bluetooth is switched off.
    #[error("Bluetooth is disabled. Please enable Bluetooth first.")]
    BluetoothDisabled,

    /// Scanning permission was not granted.
    #[error("Location permission is required for Bluetooth device scanning.")]
    BluetoothPermissionDenied,

    /// No known shoe has this id.
    #[error("Device not found: '{0}'")]
    DeviceNotFound(String),

    /// The action needs a connected shoe.
    #[error("Please connect your SoleMate device first")]
    DeviceNotConnected,

    /// The object detector failed.
    #[error("Object detection failed: {0}")]
    DetectionFailed(String),

    // =========================================================================
    // NAVIGATION & EMERGENCY ERRORS
    // =========================================================================
    /// Guidance was requested without a destination.
    #[error("Please enter a destination")]
    MissingDestination,

    /// Stop was requested with no active route.
    #[error("Navigation is not running")]
    NotNavigating,

    /// The route planner could not produce directions.
    #[error("Could not plan a route: {0}")]
    RoutePlanningFailed(String),

    /// No emergency contact has this id.
    #[error("Emergency contact not found: {0}")]
    ContactNotFound(u32),

    /// Emergency alerts are switched off in settings.
    #[error("Emergency alerts are turned off in settings")]
    EmergencyAlertsDisabled,

    // =========================================================================
    // SETTINGS & CONFIGURATION ERRORS
    // =========================================================================
    /// No settings toggle has this name.
    #[error("Unknown setting: '{0}'")]
    UnknownSetting(String),

    /// The configuration file was not found at the expected path.
    #[error("Configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// A configuration or data file could not be parsed.
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // PERSISTENCE & I/O ERRORS
    // =========================================================================
    /// An error occurred while persisting or reading data.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for SoleMate operations.
pub type Result<T> = std::result::Result<T, SoleMateError>;

impl SoleMateError {
    /// Returns `true` if this error came from the identity or account layer.
    #[inline]
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Validation(_)
                | Self::WatcherAlreadyActive
                | Self::InvalidProfileId(_)
        )
    }

    /// Returns `true` if this error is related to the shoe or its sensors.
    #[inline]
    #[must_use]
    pub const fn is_device_error(&self) -> bool {
        matches!(
            self,
            Self::BluetoothDisabled
                | Self::BluetoothPermissionDenied
                | Self::DeviceNotFound(_)
                | Self::DeviceNotConnected
                | Self::DetectionFailed(_)
        )
    }

    /// Returns `true` if this error came from the navigate or emergency screen.
    #[inline]
    #[must_use]
    pub const fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDestination
                | Self::NotNavigating
                | Self::RoutePlanningFailed(_)
                | Self::ContactNotFound(_)
                | Self::EmergencyAlertsDisabled
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error is related to I/O or persistence.
    #[inline]
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(self, Self::PersistenceError(_) | Self::IoError(_))
    }

    /// Returns `true` if this error represents an expected operational state
    /// rather than a failure.
    #[inline]
    #[must_use]
    pub const fn is_expected_state(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::Cancelled) | Self::DeviceNotConnected
        )
    }

    /// Returns `true` if retrying after a short wait may succeed.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Auth(err) => err.is_retryable(),
            Self::DeviceNotFound(_) | Self::DetectionFailed(_) | Self::RoutePlanningFailed(_) => {
                true
            }
            _ => false,
        }
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidEmail | AuthError::WeakPassword | AuthError::Cancelled => 400,
                AuthError::UnknownAccount | AuthError::WrongPassword => 401,
                AuthError::EmailInUse => 409,
                AuthError::RateLimited => 429,
                AuthError::Misconfigured(_) => 500,
                AuthError::Provider { .. } => 502,
                AuthError::NetworkFailed => 503,
            },

            // 400 Bad Request - malformed input
            Self::Validation(_) | Self::InvalidProfileId(_) | Self::MissingDestination => 400,

            // 403 Forbidden - understood but refused
            Self::BluetoothPermissionDenied | Self::EmergencyAlertsDisabled => 403,

            // 404 Not Found
            Self::DeviceNotFound(_)
            | Self::ContactNotFound(_)
            | Self::UnknownSetting(_)
            | Self::ConfigNotFound(_) => 404,

            // 409 Conflict - wrong state for the request
            Self::WatcherAlreadyActive | Self::DeviceNotConnected | Self::NotNavigating => 409,

            // 422 Unprocessable Entity - semantic errors
            Self::ParseError(_) | Self::ConfigValidationError(_) => 422,

            // 500 Internal Server Error - server-side issues
            Self::PersistenceError(_) | Self::IoError(_) | Self::DetectionFailed(_) => 500,

            // 502 Bad Gateway - upstream planner failed
            Self::RoutePlanningFailed(_) => 502,

            // 503 Service Unavailable - radio switched off
            Self::BluetoothDisabled => 503,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(err) => match err {
                AuthError::NetworkFailed => "AUTH_NETWORK_FAILED",
                AuthError::UnknownAccount => "AUTH_UNKNOWN_ACCOUNT",
                AuthError::WrongPassword => "AUTH_WRONG_PASSWORD",
                AuthError::InvalidEmail => "AUTH_INVALID_EMAIL",
                AuthError::EmailInUse => "AUTH_EMAIL_IN_USE",
                AuthError::WeakPassword => "AUTH_WEAK_PASSWORD",
                AuthError::RateLimited => "AUTH_RATE_LIMITED",
                AuthError::Cancelled => "AUTH_CANCELLED",
                AuthError::Misconfigured(_) => "AUTH_MISCONFIGURED",
                AuthError::Provider { .. } => "AUTH_PROVIDER_ERROR",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::WatcherAlreadyActive => "WATCHER_ALREADY_ACTIVE",
            Self::InvalidProfileId(_) => "INVALID_PROFILE_ID",
            Self::BluetoothDisabled => "BLUETOOTH_DISABLED",
            Self::BluetoothPermissionDenied => "BLUETOOTH_PERMISSION_DENIED",
            Self::DeviceNotFound(_) => "DEVICE_NOT_FOUND",
            Self::DeviceNotConnected => "DEVICE_NOT_CONNECTED",
            Self::DetectionFailed(_) => "DETECTION_FAILED",
            Self::MissingDestination => "MISSING_DESTINATION",
            Self::NotNavigating => "NOT_NAVIGATING",
            Self::RoutePlanningFailed(_) => "ROUTE_PLANNING_FAILED",
            Self::ContactNotFound(_) => "CONTACT_NOT_FOUND",
            Self::EmergencyAlertsDisabled => "EMERGENCY_ALERTS_DISABLED",
            Self::UnknownSetting(_) => "UNKNOWN_SETTING",
            Self::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::PersistenceError(_) => "PERSISTENCE_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<AccountError> for SoleMateError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(e) => Self::Validation(e),
            AccountError::Auth { source, .. } => Self::Auth(source),
        }
    }
}

impl From<crate::watcher::WatcherError> for SoleMateError {
    fn from(err: crate::watcher::WatcherError) -> Self {
        match err {
            crate::watcher::WatcherError::AlreadyActive => Self::WatcherAlreadyActive,
        }
    }
}

impl From<crate::profile::ProfileError> for SoleMateError {
    fn from(err: crate::profile::ProfileError) -> Self {
        use crate::profile::ProfileError;
        match err {
            ProfileError::ReadError { path, source } => {
                Self::PersistenceError(format!("Failed to read {}: {}", path.display(), source))
            }
            ProfileError::WriteError { path, source } => {
                Self::PersistenceError(format!("Failed to write {}: {}", path.display(), source))
            }
            ProfileError::ParseError { path, source } => {
                Self::ParseError(format!("{}: {}", path.display(), source))
            }
            ProfileError::SerializeError(e) => Self::PersistenceError(e.to_string()),
            ProfileError::InvalidId(id) => Self::InvalidProfileId(id),
        }
    }
}

impl From<crate::bluetooth::BluetoothError> for SoleMateError {
    fn from(err: crate::bluetooth::BluetoothError) -> Self {
        use crate::bluetooth::BluetoothError;
        match err {
            BluetoothError::Disabled => Self::BluetoothDisabled,
            BluetoothError::PermissionDenied => Self::BluetoothPermissionDenied,
            BluetoothError::DeviceNotFound { id } => Self::DeviceNotFound(id),
            BluetoothError::NotConnected => Self::DeviceNotConnected,
        }
    }
}

impl From<crate::detection::DetectionError> for SoleMateError {
    fn from(err: crate::detection::DetectionError) -> Self {
        use crate::detection::DetectionError;
        match err {
            DetectionError::DeviceNotConnected => Self::DeviceNotConnected,
            DetectionError::DetectorFailed(message) => Self::DetectionFailed(message),
        }
    }
}

impl From<crate::navigation::NavigationError> for SoleMateError {
    fn from(err: crate::navigation::NavigationError) -> Self {
        use crate::navigation::NavigationError;
        match err {
            NavigationError::MissingDestination => Self::MissingDestination,
            NavigationError::DeviceNotConnected => Self::DeviceNotConnected,
            NavigationError::NotNavigating => Self::NotNavigating,
            NavigationError::PlannerFailed(message) => Self::RoutePlanningFailed(message),
        }
    }
}

impl From<crate::emergency::EmergencyError> for SoleMateError {
    fn from(err: crate::emergency::EmergencyError) -> Self {
        use crate::emergency::EmergencyError;
        match err {
            EmergencyError::ContactNotFound(id) => Self::ContactNotFound(id),
            EmergencyError::AlertsDisabled => Self::EmergencyAlertsDisabled,
        }
    }
}

impl From<crate::settings::SettingsError> for SoleMateError {
    fn from(err: crate::settings::SettingsError) -> Self {
        use crate::settings::SettingsError;
        match err {
            SettingsError::ReadError { path, source } => {
                Self::PersistenceError(format!("Failed to read {}: {}", path.display(), source))
            }
            SettingsError::WriteError { path, source } => {
                Self::PersistenceError(format!("Failed to write {}: {}", path.display(), source))
            }
            SettingsError::ParseError(e) => Self::ParseError(e.to_string()),
            SettingsError::UnknownKey(key) => Self::UnknownSetting(key),
        }
    }
}

impl From<crate::config::ConfigError> for SoleMateError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path.into()),
            ConfigError::ReadError { path, source } => {
                Self::PersistenceError(format!("Failed to read {path}: {source}"))
            }
            ConfigError::ParseError(e) => Self::ParseError(e.to_string()),
            ConfigError::ValidationError { field, message } => {
                Self::ConfigValidationError(format!("{field}: {message}"))
            }
            ConfigError::MultipleValidationErrors(errors) => {
                let messages: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
                Self::ConfigValidationError(messages.join("; "))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
