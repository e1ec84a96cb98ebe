//! Application state shared across handlers.

use std::sync::Arc;

use solemate_core::{
    AccountService, Config, DetectionSession, DeviceScanner, EmergencyCenter, IdentityProvider,
    MemoryIdentityProvider, MockDeviceScanner, MockObjectDetector, MockRoutePlanner,
    NavigationGate, NavigationSession, SessionWatcher, Settings, SettingsStore, Storage,
};
use tokio::sync::RwLock;
use tracing::info;

/// State behind the server's lock.
pub type SharedState = Arc<RwLock<AppState>>;

/// Everything the root view owns: the session watcher and gate, plus the
/// capabilities the authenticated screens use.
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// The identity backend. Kept concrete so operators and tests can steer it.
    pub provider: Arc<MemoryIdentityProvider>,
    /// Keeps the published session current.
    pub watcher: SessionWatcher,
    /// Selects the flow from the watcher's session.
    pub gate: NavigationGate,
    /// Account actions for the unauthenticated screens.
    pub accounts: AccountService,
    /// Smart shoe pairing.
    pub devices: Box<dyn DeviceScanner>,
    /// Obstacle detection.
    pub detection: DetectionSession,
    /// Turn-by-turn guidance.
    pub navigation: NavigationSession,
    /// Emergency contacts and sent alerts.
    pub emergency: EmergencyCenter,
    /// Current settings panel values.
    pub settings: Settings,
    /// Where `settings` is persisted.
    pub settings_store: SettingsStore,
}

impl AppState {
    /// Builds the state from configuration. The watcher is not activated.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be loaded.
    pub fn new(config: Config) -> solemate_core::Result<Self> {
        let storage = Storage::new(config.data_dir());
        let settings_store = SettingsStore::new(storage.settings_path());
        let settings = settings_store.load()?;

        let provider = Arc::new(MemoryIdentityProvider::from_config(&config.identity));
        let identity: Arc<dyn IdentityProvider> = provider.clone();
        let watcher = SessionWatcher::new(Arc::clone(&identity));
        let gate = watcher.gate();
        let accounts = AccountService::new(identity, Arc::new(storage));
        let devices = MockDeviceScanner::new().with_radio(
            config.devices.bluetooth_enabled,
            config.devices.location_permitted,
        );

        info!(
            data_dir = %config.data_dir().display(),
            project = %config.identity.project_id,
            "Application state initialised"
        );

        Ok(Self {
            config,
            provider,
            watcher,
            gate,
            accounts,
            devices: Box::new(devices),
            detection: DetectionSession::new(Box::new(MockObjectDetector::new())),
            navigation: NavigationSession::new(Box::new(MockRoutePlanner::new())),
            emergency: EmergencyCenter::new(),
            settings,
            settings_store,
        })
    }

    /// Wraps the state for sharing with handlers.
    #[must_use]
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}
