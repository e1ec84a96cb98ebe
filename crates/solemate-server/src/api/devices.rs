//! Device API endpoints for the pairing screen.
//!
//! All routes require the authenticated flow.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use solemate_core::{BatteryLevel, DeviceStatus, RadioStatus, ShoeDevice, SignalStrength};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::session::require_authenticated;
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A smart shoe as shown on the pairing screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "solemate-001",
    "name": "SoleMate-001",
    "address": "00:11:22:33:44:55",
    "paired": true,
    "status": "connected",
    "rssi_dbm": -45,
    "signal": "excellent",
    "battery_percent": 85,
    "battery": "full"
}))]
pub struct DeviceResponse {
    /// Stable device id.
    #[schema(example = "solemate-001")]
    pub id: String,

    /// Advertised name.
    #[schema(example = "SoleMate-001")]
    pub name: String,

    /// Radio address.
    #[schema(example = "00:11:22:33:44:55")]
    pub address: String,

    /// Whether this is the paired shoe.
    pub paired: bool,

    /// Connection status.
    pub status: DeviceStatus,

    /// Last signal reading in dBm.
    #[schema(example = -45)]
    pub rssi_dbm: Option<i16>,

    /// Signal bucket for the reading.
    pub signal: SignalStrength,

    /// Battery charge.
    #[schema(example = 85)]
    pub battery_percent: u8,

    /// Battery bucket.
    pub battery: BatteryLevel,
}

impl From<ShoeDevice> for DeviceResponse {
    fn from(device: ShoeDevice) -> Self {
        let signal = device.signal();
        let battery = device.battery();
        Self {
            id: device.id,
            name: device.name,
            address: device.address,
            paired: device.paired,
            status: device.status,
            rssi_dbm: device.rssi_dbm,
            signal,
            battery_percent: device.battery_percent,
            battery,
        }
    }
}

/// Known devices and the connected one.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DevicesResponse {
    /// Every known device.
    pub devices: Vec<DeviceResponse>,

    /// The connected device, if any.
    #[schema(nullable)]
    pub connected: Option<DeviceResponse>,

    /// Whether scanning is possible.
    pub radio: RadioStatus,
}

impl DevicesResponse {
    fn new(devices: Vec<ShoeDevice>, radio: RadioStatus) -> Self {
        let connected = devices.iter().find(|d| d.paired).cloned().map(Into::into);
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
            connected,
            radio,
        }
    }
}

/// Device scan response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanDevicesResponse {
    /// Every known device after the scan.
    pub devices: Vec<DeviceResponse>,

    /// How long the scan took.
    #[schema(example = 3)]
    pub scan_duration_secs: u64,

    /// When the scan completed.
    #[schema(example = "2025-01-15T03:30:00Z")]
    pub scanned_at_utc: String,
}

// ============================================================================
// Router
// ============================================================================

/// Creates the devices router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/scan", post(scan_devices))
        .route("/devices/{id}/connect", post(connect_device))
        .route("/devices/disconnect", post(disconnect_device))
        .route("/devices/refresh", post(refresh_devices))
        .route("/devices/enable", post(enable_bluetooth))
        .route("/devices/permission", post(request_permission))
}

// ============================================================================
// Handlers
// ============================================================================

/// List known devices.
#[utoipa::path(
    get,
    path = "/api/devices",
    tag = "devices",
    operation_id = "listDevices",
    summary = "List known smart shoes",
    responses(
        (status = 200, description = "Known devices", body = DevicesResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn list_devices(State(state): State<SharedState>) -> ApiResult<Json<DevicesResponse>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;
    let devices = &state_guard.devices;
    Ok(Json(DevicesResponse::new(devices.devices(), devices.radio())))
}

/// Scan for nearby smart shoes.
#[utoipa::path(
    post,
    path = "/api/devices/scan",
    tag = "devices",
    operation_id = "scanDevices",
    summary = "Scan for smart shoes",
    description = "Scans for `devices.scan_duration_secs` seconds and returns \
        every known device. Requires Bluetooth to be enabled and scanning to \
        be permitted.",
    responses(
        (status = 200, description = "Scan completed", body = ScanDevicesResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Scanning not permitted", body = ErrorResponse),
        (status = 503, description = "Bluetooth disabled", body = ErrorResponse)
    )
)]
pub async fn scan_devices(
    State(state): State<SharedState>,
) -> ApiResult<Json<ScanDevicesResponse>> {
    let scan_duration_secs = {
        let state_guard = state.read().await;
        require_authenticated(&state_guard)?;
        state_guard.config.devices.scan_duration_secs
    };

    info!(scan_duration_secs, "Scanning for devices");
    tokio::time::sleep(Duration::from_secs(scan_duration_secs)).await;

    let mut state_guard = state.write().await;
    // The session may have ended while the scan was running.
    require_authenticated(&state_guard)?;
    let devices = state_guard.devices.scan().await?;

    Ok(Json(ScanDevicesResponse {
        devices: devices.into_iter().map(Into::into).collect(),
        scan_duration_secs,
        scanned_at_utc: Utc::now().to_rfc3339(),
    }))
}

/// Connect to a smart shoe.
#[utoipa::path(
    post,
    path = "/api/devices/{id}/connect",
    tag = "devices",
    operation_id = "connectDevice",
    summary = "Pair with a smart shoe",
    description = "Pairs with the device. Any previously paired device is \
        released; at most one shoe is connected at a time.",
    params(("id" = String, Path, description = "Device id", example = "solemate-001")),
    responses(
        (status = 200, description = "Connected", body = DeviceResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Unknown device", body = ErrorResponse),
        (status = 503, description = "Bluetooth disabled", body = ErrorResponse)
    )
)]
pub async fn connect_device(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeviceResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let device = state_guard.devices.connect(&id).await?;
    Ok(Json(device.into()))
}

/// Disconnect the connected smart shoe.
#[utoipa::path(
    post,
    path = "/api/devices/disconnect",
    tag = "devices",
    operation_id = "disconnectDevice",
    summary = "Disconnect the paired shoe",
    responses(
        (status = 200, description = "Disconnected", body = DeviceResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "No device connected", body = ErrorResponse)
    )
)]
pub async fn disconnect_device(
    State(state): State<SharedState>,
) -> ApiResult<Json<DeviceResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let device = state_guard.devices.disconnect().await?;
    Ok(Json(device.into()))
}

/// Refresh signal and battery readings.
#[utoipa::path(
    post,
    path = "/api/devices/refresh",
    tag = "devices",
    operation_id = "refreshDevices",
    summary = "Refresh device readings",
    responses(
        (status = 200, description = "Readings refreshed", body = DevicesResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 503, description = "Bluetooth disabled", body = ErrorResponse)
    )
)]
pub async fn refresh_devices(
    State(state): State<SharedState>,
) -> ApiResult<Json<DevicesResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let devices = state_guard.devices.refresh().await?;
    Ok(Json(DevicesResponse::new(devices, state_guard.devices.radio())))
}

/// Switch Bluetooth on.
#[utoipa::path(
    post,
    path = "/api/devices/enable",
    tag = "devices",
    operation_id = "enableBluetooth",
    summary = "Enable Bluetooth",
    responses(
        (status = 200, description = "Bluetooth enabled", body = RadioStatus),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn enable_bluetooth(State(state): State<SharedState>) -> ApiResult<Json<RadioStatus>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let radio = state_guard.devices.enable().await?;
    Ok(Json(radio))
}

/// Ask for the location permission scanning needs.
#[utoipa::path(
    post,
    path = "/api/devices/permission",
    tag = "devices",
    operation_id = "requestScanPermission",
    summary = "Request scan permission",
    responses(
        (status = 200, description = "Permission granted", body = RadioStatus),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Permission refused", body = ErrorResponse)
    )
)]
pub async fn request_permission(
    State(state): State<SharedState>,
) -> ApiResult<Json<RadioStatus>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    let radio = state_guard.devices.request_permission().await?;
    info!(?radio, "Scan permission requested");
    Ok(Json(radio))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(paired: bool) -> ShoeDevice {
        ShoeDevice {
            id: "solemate-002".to_string(),
            name: "SoleMate-002".to_string(),
            address: "00:11:22:33:44:56".to_string(),
            paired,
            rssi_dbm: Some(-67),
            battery_percent: 72,
            status: if paired {
                DeviceStatus::Connected
            } else {
                DeviceStatus::Available
            },
        }
    }

    #[test]
    fn test_device_response_buckets() {
        let response = DeviceResponse::from(device(false));
        assert_eq!(response.signal, SignalStrength::Fair);
        assert_eq!(response.battery, BatteryLevel::Half);
    }

    const RADIO_ON: RadioStatus = RadioStatus {
        enabled: true,
        permission_granted: true,
    };

    #[test]
    fn test_devices_response_finds_connected() {
        let response = DevicesResponse::new(vec![device(true)], RADIO_ON);
        assert_eq!(response.connected.unwrap().id, "solemate-002");

        let response = DevicesResponse::new(vec![device(false)], RADIO_ON);
        assert!(response.connected.is_none());
        assert!(response.radio.enabled);
    }

    #[test]
    fn test_device_response_serialization() {
        let json = serde_json::to_value(DeviceResponse::from(device(true))).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["signal"], "fair");
    }
}
