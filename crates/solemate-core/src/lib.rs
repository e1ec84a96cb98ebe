//! # solemate-core
//!
//! Core logic for the SoleMate smart-shoe companion.
//!
//! This crate provides:
//! - Session tracking driven by identity provider notifications
//! - The navigation gate that picks which screens are reachable
//! - Account flows (sign-in, Google sign-in, sign-up, sign-out) and profiles
//! - Smart shoe discovery and pairing, obstacle detection, and app settings
//! - Navigation guidance and emergency alerts
//!
//! ## Architecture
//!
//! - [`identity`] - Identity provider contract, principals and auth errors
//! - [`provider`] - In-memory identity provider used by the server and tests
//! - [`session`] - The published session value
//! - [`watcher`] - Subscription lifecycle that keeps the session current
//! - [`gate`] - Flow and screen selection from the session
//! - [`account`] - Input validation and account actions with user notices
//! - [`profile`] - Profile documents and the profile store contract
//! - [`storage`] - JSON file storage for profiles and settings
//! - [`bluetooth`] - Shoe scanning, pairing and signal/battery buckets
//! - [`detection`] - Obstacle detection with capped history
//! - [`navigation`] - Turn-by-turn guidance through the shoe
//! - [`emergency`] - Emergency contacts, alerts and calls
//! - [`settings`] - Settings panel toggles
//! - [`config`] - Application configuration loading and validation
//! - [`error`] - Unified error type for the crate

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod account;
pub mod bluetooth;
pub mod config;
pub mod detection;
pub mod emergency;
pub mod error;
pub mod gate;
pub mod identity;
pub mod navigation;
pub mod profile;
pub mod provider;
pub mod session;
pub mod settings;
pub mod storage;
pub mod watcher;

// Re-export primary types for convenience
pub use account::{
    AccountAction, AccountError, AccountOutcome, AccountResult, AccountService, Notice,
    SignUpForm, ValidationError,
};
pub use bluetooth::{
    BatteryLevel, BluetoothError, BluetoothResult, DeviceScanner, DeviceStatus,
    MockDeviceScanner, RadioStatus, ShoeDevice, SignalStrength,
};
pub use config::{Config, ConfigError, ConfigResult};
pub use detection::{
    DetectedObject, DetectionError, DetectionResult, DetectionSession, Direction,
    MockObjectDetector, ObjectDetector, Risk,
};
pub use emergency::{
    ContactKind, EmergencyAlert, EmergencyCenter, EmergencyContact, EmergencyError,
    EmergencyResult,
};
pub use error::{Result, SoleMateError};
pub use gate::{Flow, NavigationGate, Screen};
pub use identity::{
    AuthError, AuthResult, IdentityProvider, NewAccount, Principal, SessionEvent, SignInMethod,
    Subscription, SubscriptionId,
};
pub use navigation::{
    MockRoutePlanner, NavigationError, NavigationResult, NavigationSession, Route, RoutePlanner,
};
pub use profile::{MemoryProfileStore, ProfileDocument, ProfileError, ProfileStore};
pub use provider::MemoryIdentityProvider;
pub use session::{Session, SessionState};
pub use settings::{SettingKey, Settings, SettingsError, SettingsStore};
pub use storage::{default_data_dir, Storage};
pub use watcher::{SessionWatcher, WatcherError};
