//! Smart-shoe discovery and pairing over Bluetooth.
//!
//! This module provides:
//! - The [`DeviceScanner`] capability used by the device screen
//! - Signal strength and battery classification
//! - [`MockDeviceScanner`], a deterministic stand-in until real hardware
//!   integration exists

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;

/// Errors from scanning and pairing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BluetoothError {
    /// Bluetooth is switched off on the phone.
    #[error("Bluetooth is disabled. Please enable Bluetooth first.")]
    Disabled,

    /// Location permission, required for scanning, was not granted.
    #[error("Location permission is required for Bluetooth device scanning.")]
    PermissionDenied,

    /// No known device has this id.
    #[error("Device not found: '{id}'")]
    DeviceNotFound {
        /// The requested device id.
        id: String,
    },

    /// Disconnect requested with no connected device.
    #[error("No SoleMate device is connected")]
    NotConnected,
}

/// Result type for Bluetooth operations.
pub type BluetoothResult<T> = std::result::Result<T, BluetoothError>;

/// Connection status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Discovered and ready to pair.
    Available,
    /// Paired and connected.
    Connected,
}

/// Qualitative signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    /// RSSI above -50 dBm.
    Excellent,
    /// RSSI above -60 dBm.
    Good,
    /// RSSI above -70 dBm.
    Fair,
    /// RSSI at or below -70 dBm.
    Poor,
    /// No reading.
    Unknown,
}

impl SignalStrength {
    /// Classifies an RSSI reading.
    #[must_use]
    pub const fn from_rssi(rssi_dbm: Option<i16>) -> Self {
        match rssi_dbm {
            None => Self::Unknown,
            Some(rssi) if rssi > -50 => Self::Excellent,
            Some(rssi) if rssi > -60 => Self::Good,
            Some(rssi) if rssi > -70 => Self::Fair,
            Some(_) => Self::Poor,
        }
    }
}

/// Qualitative battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatteryLevel {
    /// Above 75%.
    Full,
    /// Above 50%.
    Half,
    /// Above 25%.
    Quarter,
    /// 25% or less.
    Empty,
}

impl BatteryLevel {
    /// Classifies a battery percentage.
    #[must_use]
    pub const fn from_percent(percent: u8) -> Self {
        match percent {
            76..=u8::MAX => Self::Full,
            51..=75 => Self::Half,
            26..=50 => Self::Quarter,
            _ => Self::Empty,
        }
    }
}

/// A discovered smart shoe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShoeDevice {
    /// Stable identifier.
    #[schema(example = "solemate-001")]
    pub id: String,
    /// Advertised name.
    #[schema(example = "SoleMate-001")]
    pub name: String,
    /// Bluetooth MAC address.
    #[schema(example = "00:11:22:33:44:55")]
    pub address: String,
    /// Whether this device is the paired one.
    pub paired: bool,
    /// Last RSSI reading in dBm.
    #[schema(example = -45)]
    pub rssi_dbm: Option<i16>,
    /// Battery charge.
    #[schema(example = 85)]
    pub battery_percent: u8,
    /// Connection status.
    pub status: DeviceStatus,
}

impl ShoeDevice {
    /// Signal strength bucket for the last reading.
    #[must_use]
    pub const fn signal(&self) -> SignalStrength {
        SignalStrength::from_rssi(self.rssi_dbm)
    }

    /// Battery bucket.
    #[must_use]
    pub const fn battery(&self) -> BatteryLevel {
        BatteryLevel::from_percent(self.battery_percent)
    }
}

/// Whether scanning is possible right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RadioStatus {
    /// Bluetooth is switched on.
    pub enabled: bool,
    /// The location permission required for scanning is granted.
    pub permission_granted: bool,
}

/// Discovery and pairing of smart shoes.
#[async_trait]
pub trait DeviceScanner: Send + Sync {
    /// Known devices, in discovery order.
    fn devices(&self) -> Vec<ShoeDevice>;

    /// Current radio and permission state.
    fn radio(&self) -> RadioStatus;

    /// Switches Bluetooth on.
    async fn enable(&mut self) -> BluetoothResult<RadioStatus>;

    /// Asks for the location permission scanning needs.
    ///
    /// Fails with [`BluetoothError::PermissionDenied`] if the user refuses.
    async fn request_permission(&mut self) -> BluetoothResult<RadioStatus>;

    /// The connected device, if any.
    fn connected(&self) -> Option<ShoeDevice> {
        self.devices().into_iter().find(|d| d.paired)
    }

    /// Runs a discovery scan and returns every known device.
    async fn scan(&mut self) -> BluetoothResult<Vec<ShoeDevice>>;

    /// Connects to `id`, disconnecting any other device.
    async fn connect(&mut self, id: &str) -> BluetoothResult<ShoeDevice>;

    /// Disconnects the connected device.
    async fn disconnect(&mut self) -> BluetoothResult<ShoeDevice>;

    /// Refreshes signal and battery readings.
    async fn refresh(&mut self) -> BluetoothResult<Vec<ShoeDevice>>;
}

/// A scanner that simulates nearby SoleMate shoes.
///
/// Readings change deterministically so behaviour is reproducible in tests.
#[derive(Debug, Clone)]
pub struct MockDeviceScanner {
    devices: Vec<ShoeDevice>,
    enabled: bool,
    permitted: bool,
    ticks: u32,
}

impl Default for MockDeviceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDeviceScanner {
    /// A scanner with three shoes in range.
    #[must_use]
    pub fn new() -> Self {
        let devices = [(-45, 85), (-67, 72), (-55, 91)]
            .into_iter()
            .zip(1u8..)
            .map(|((rssi, battery), n)| mock_device(n, rssi, battery))
            .collect();
        Self {
            devices,
            enabled: true,
            permitted: true,
            ticks: 0,
        }
    }

    /// Starts with the given radio and permission state.
    #[must_use]
    pub const fn with_radio(mut self, enabled: bool, permitted: bool) -> Self {
        self.enabled = enabled;
        self.permitted = permitted;
        self
    }

    const fn check_ready(&self) -> BluetoothResult<()> {
        if !self.enabled {
            return Err(BluetoothError::Disabled);
        }
        if !self.permitted {
            return Err(BluetoothError::PermissionDenied);
        }
        Ok(())
    }

    fn next_reading(&mut self) -> i16 {
        self.ticks = self.ticks.wrapping_add(1);
        // Walks -70..=-31 in steps of 7.
        -70 + i16::try_from(self.ticks.wrapping_mul(7) % 40).unwrap_or(0)
    }
}

fn mock_device(n: u8, rssi_dbm: i16, battery_percent: u8) -> ShoeDevice {
    ShoeDevice {
        id: format!("solemate-{n:03}"),
        name: format!("SoleMate-{n:03}"),
        address: format!("00:11:22:33:44:{:02X}", 0x54 + u16::from(n)),
        paired: false,
        rssi_dbm: Some(rssi_dbm),
        battery_percent,
        status: DeviceStatus::Available,
    }
}

#[async_trait]
impl DeviceScanner for MockDeviceScanner {
    fn devices(&self) -> Vec<ShoeDevice> {
        self.devices.clone()
    }

    fn radio(&self) -> RadioStatus {
        RadioStatus {
            enabled: self.enabled,
            permission_granted: self.permitted,
        }
    }

    async fn enable(&mut self) -> BluetoothResult<RadioStatus> {
        if !self.enabled {
            self.enabled = true;
            info!("Bluetooth enabled");
        }
        Ok(self.radio())
    }

    async fn request_permission(&mut self) -> BluetoothResult<RadioStatus> {
        if !self.permitted {
            self.permitted = true;
            info!("Location permission granted");
        }
        Ok(self.radio())
    }

    async fn scan(&mut self) -> BluetoothResult<Vec<ShoeDevice>> {
        self.check_ready()?;

        let n = u8::try_from(self.devices.len() + 1).unwrap_or(u8::MAX);
        let rssi = self.next_reading();
        let battery = 70 + u8::try_from((u16::from(n) * 7) % 30).unwrap_or(0);
        let found = mock_device(n, rssi, battery);
        if self.devices.iter().all(|d| d.id != found.id) {
            info!(id = %found.id, rssi_dbm = rssi, "Discovered device");
            self.devices.push(found);
        }

        Ok(self.devices.clone())
    }

    async fn connect(&mut self, id: &str) -> BluetoothResult<ShoeDevice> {
        self.check_ready()?;
        if !self.devices.iter().any(|d| d.id == id) {
            return Err(BluetoothError::DeviceNotFound { id: id.to_string() });
        }

        for device in &mut self.devices {
            device.paired = device.id == id;
            device.status = if device.paired {
                DeviceStatus::Connected
            } else {
                DeviceStatus::Available
            };
        }

        let connected = self.connected().ok_or(BluetoothError::NotConnected)?;
        info!(id, name = %connected.name, "Connected to device");
        Ok(connected)
    }

    async fn disconnect(&mut self) -> BluetoothResult<ShoeDevice> {
        let connected = self.connected().ok_or(BluetoothError::NotConnected)?;
        for device in &mut self.devices {
            device.paired = false;
            device.status = DeviceStatus::Available;
        }
        info!(id = %connected.id, "Disconnected device");
        Ok(ShoeDevice {
            paired: false,
            status: DeviceStatus::Available,
            ..connected
        })
    }

    async fn refresh(&mut self) -> BluetoothResult<Vec<ShoeDevice>> {
        self.check_ready()?;
        let count = self.devices.len();
        for i in 0..count {
            let rssi = self.next_reading();
            let delta: i16 = if self.ticks % 2 == 0 { 3 } else { -4 };
            let device = &mut self.devices[i];
            let battery = (i16::from(device.battery_percent) + delta).clamp(20, 100);
            device.battery_percent = u8::try_from(battery).unwrap_or(100);
            device.rssi_dbm = Some(rssi);
        }
        debug!(count, "Refreshed device readings");
        Ok(self.devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_buckets() {
        assert_eq!(SignalStrength::from_rssi(Some(-45)), SignalStrength::Excellent);
        assert_eq!(SignalStrength::from_rssi(Some(-50)), SignalStrength::Good);
        assert_eq!(SignalStrength::from_rssi(Some(-55)), SignalStrength::Good);
        assert_eq!(SignalStrength::from_rssi(Some(-60)), SignalStrength::Fair);
        assert_eq!(SignalStrength::from_rssi(Some(-70)), SignalStrength::Poor);
        assert_eq!(SignalStrength::from_rssi(None), SignalStrength::Unknown);
    }

    #[test]
    fn test_battery_buckets() {
        assert_eq!(BatteryLevel::from_percent(100), BatteryLevel::Full);
        assert_eq!(BatteryLevel::from_percent(75), BatteryLevel::Half);
        assert_eq!(BatteryLevel::from_percent(50), BatteryLevel::Quarter);
        assert_eq!(BatteryLevel::from_percent(25), BatteryLevel::Empty);
    }

    #[test]
    fn test_initial_devices() {
        let scanner = MockDeviceScanner::new();
        let devices = scanner.devices();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].name, "SoleMate-001");
        assert_eq!(devices[0].address, "00:11:22:33:44:55");
        assert!(scanner.connected().is_none());
    }

    #[tokio::test]
    async fn test_scan_discovers_next_device() {
        let mut scanner = MockDeviceScanner::new();
        let devices = scanner.scan().await.unwrap();
        assert_eq!(devices.len(), 4);
        assert_eq!(devices[3].id, "solemate-004");
        assert!(devices[3].battery_percent >= 70);
    }

    #[tokio::test]
    async fn test_scan_requires_bluetooth_and_permission() {
        let mut scanner = MockDeviceScanner::new().with_radio(false, false);
        assert_eq!(scanner.scan().await, Err(BluetoothError::Disabled));
        assert_eq!(scanner.refresh().await, Err(BluetoothError::Disabled));

        let radio = scanner.enable().await.unwrap();
        assert!(radio.enabled);
        assert!(!radio.permission_granted);
        assert_eq!(scanner.scan().await, Err(BluetoothError::PermissionDenied));

        let radio = scanner.request_permission().await.unwrap();
        assert!(radio.permission_granted);
        assert_eq!(scanner.scan().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let mut scanner = MockDeviceScanner::new();
        let before = scanner.radio();
        assert_eq!(scanner.enable().await.unwrap(), before);
        assert_eq!(scanner.request_permission().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_connect_pairs_exactly_one_device() {
        let mut scanner = MockDeviceScanner::new();
        scanner.connect("solemate-001").await.unwrap();
        let device = scanner.connect("solemate-002").await.unwrap();
        assert_eq!(device.status, DeviceStatus::Connected);

        let paired: Vec<_> = scanner.devices().into_iter().filter(|d| d.paired).collect();
        assert_eq!(paired.len(), 1);
        assert_eq!(paired[0].id, "solemate-002");
    }

    #[tokio::test]
    async fn test_connect_unknown_device() {
        let mut scanner = MockDeviceScanner::new();
        assert_eq!(
            scanner.connect("solemate-999").await,
            Err(BluetoothError::DeviceNotFound {
                id: "solemate-999".into()
            })
        );
    }

    #[tokio::test]
    async fn test_disconnect() {
        let mut scanner = MockDeviceScanner::new();
        assert_eq!(
            scanner.disconnect().await,
            Err(BluetoothError::NotConnected)
        );
        scanner.connect("solemate-003").await.unwrap();
        let device = scanner.disconnect().await.unwrap();
        assert_eq!(device.id, "solemate-003");
        assert!(!device.paired);
        assert!(scanner.connected().is_none());
    }

    #[tokio::test]
    async fn test_refresh_keeps_battery_in_range() {
        let mut scanner = MockDeviceScanner::new();
        for _ in 0..50 {
            for device in scanner.refresh().await.unwrap() {
                assert!((20..=100).contains(&device.battery_percent));
                assert!(device.rssi_dbm.is_some());
            }
        }
    }
}
