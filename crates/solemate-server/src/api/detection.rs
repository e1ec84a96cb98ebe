//! Obstacle detection API endpoints.
//!
//! All routes require the authenticated flow; running detection also needs
//! a connected shoe.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use solemate_core::detection::HISTORY_LIMIT;
use solemate_core::DetectedObject;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::session::require_authenticated;
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Latest detections.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "objects": [{
        "label": "Chair",
        "confidence": 0.95,
        "distance_m": 2.0,
        "direction": "center",
        "risk": "low",
        "detected_at": "2025-01-15T03:30:00Z"
    }],
    "announcements": ["Chair, center, 2.0 m (95%)"],
    "checked_at_utc": "2025-01-15T03:30:00Z"
}))]
pub struct DetectionResponse {
    /// Objects currently in view.
    pub objects: Vec<DetectedObject>,

    /// One voice guidance line per object, in the same order.
    pub announcements: Vec<String>,

    /// When the response was produced.
    #[schema(example = "2025-01-15T03:30:00Z")]
    pub checked_at_utc: String,
}

/// Detection history, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DetectionHistoryResponse {
    /// Past detections.
    pub entries: Vec<DetectedObject>,

    /// Number of entries.
    #[schema(example = 4)]
    pub total: usize,

    /// Maximum number of entries kept.
    #[schema(example = 20)]
    pub limit: usize,
}

impl DetectionHistoryResponse {
    fn new(entries: Vec<DetectedObject>) -> Self {
        Self {
            total: entries.len(),
            entries,
            limit: HISTORY_LIMIT,
        }
    }
}

impl DetectionResponse {
    fn new(objects: Vec<DetectedObject>) -> Self {
        Self {
            announcements: objects.iter().map(DetectedObject::announcement).collect(),
            objects,
            checked_at_utc: Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the detection router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/detection/run", post(run_detection))
        .route("/detection/stop", post(stop_detection))
        .route(
            "/detection/history",
            get(get_detection_history).delete(clear_detection_history),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// Run one detection pass.
#[utoipa::path(
    post,
    path = "/api/detection/run",
    tag = "detection",
    operation_id = "runDetection",
    summary = "Detect obstacles",
    description = "Runs one detection pass and records the results in the \
        history. Requires a connected SoleMate device.",
    responses(
        (status = 200, description = "Detection completed", body = DetectionResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "No device connected", body = ErrorResponse)
    )
)]
pub async fn run_detection(
    State(state): State<SharedState>,
) -> ApiResult<Json<DetectionResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;

    let connected = state_guard.devices.connected().is_some();
    let objects = state_guard.detection.run(connected).await?.to_vec();

    Ok(Json(DetectionResponse::new(objects)))
}

/// Stop detection.
#[utoipa::path(
    post,
    path = "/api/detection/stop",
    tag = "detection",
    operation_id = "stopDetection",
    summary = "Stop detecting",
    description = "Clears the latest detections. History is kept.",
    responses(
        (status = 200, description = "Detection stopped", body = DetectionResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn stop_detection(
    State(state): State<SharedState>,
) -> ApiResult<Json<DetectionResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    state_guard.detection.stop();

    Ok(Json(DetectionResponse::new(
        state_guard.detection.latest().to_vec(),
    )))
}

/// Get detection history.
#[utoipa::path(
    get,
    path = "/api/detection/history",
    tag = "detection",
    operation_id = "getDetectionHistory",
    summary = "Get detection history",
    responses(
        (status = 200, description = "History retrieved", body = DetectionHistoryResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_detection_history(
    State(state): State<SharedState>,
) -> ApiResult<Json<DetectionHistoryResponse>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;
    Ok(Json(DetectionHistoryResponse::new(
        state_guard.detection.history(),
    )))
}

/// Clear detection history.
#[utoipa::path(
    delete,
    path = "/api/detection/history",
    tag = "detection",
    operation_id = "clearDetectionHistory",
    summary = "Clear detection history",
    responses(
        (status = 200, description = "History cleared", body = DetectionHistoryResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn clear_detection_history(
    State(state): State<SharedState>,
) -> ApiResult<Json<DetectionHistoryResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;
    state_guard.detection.clear_history();
    Ok(Json(DetectionHistoryResponse::new(Vec::new())))
}
