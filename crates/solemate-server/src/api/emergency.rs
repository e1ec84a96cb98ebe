//! Emergency API endpoints.
//!
//! Alerts honour the `emergency_alerts` and `location_sharing` settings.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use solemate_core::{EmergencyAlert, EmergencyContact};
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::api::session::require_authenticated;
use crate::state::SharedState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// The emergency contact list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContactsResponse {
    /// Contacts, emergency services first.
    pub contacts: Vec<EmergencyContact>,

    /// Number of contacts.
    #[schema(example = 3)]
    pub total: usize,
}

/// A sent alert with the confirmation the screen shows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertResponse {
    /// The alert that was sent.
    pub alert: EmergencyAlert,

    /// Confirmation heading.
    #[schema(example = "Emergency Alert Sent")]
    pub title: String,

    /// Confirmation body.
    #[schema(example = "Your location and emergency alert have been sent to all emergency contacts.")]
    pub message: String,
}

impl AlertResponse {
    fn new(alert: EmergencyAlert) -> Self {
        let message = if alert.location.is_some() {
            "Your location and emergency alert have been sent to all emergency contacts."
        } else {
            "Your emergency alert has been sent to all emergency contacts."
        };
        Self {
            alert,
            title: "Emergency Alert Sent".to_string(),
            message: message.to_string(),
        }
    }
}

/// What to dial for a contact.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "contact": {"id": 1, "name": "Emergency Services", "number": "911", "kind": "emergency"},
    "dial_uri": "tel:911"
}))]
pub struct CallResponse {
    /// The contact being called.
    pub contact: EmergencyContact,

    /// URI handed to the phone dialer.
    #[schema(example = "tel:911")]
    pub dial_uri: String,
}

// ============================================================================
// Router
// ============================================================================

/// Creates the emergency router.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/emergency/contacts", get(list_contacts))
        .route("/emergency/contacts/{id}/call", post(call_contact))
        .route("/emergency/alert", post(send_alert))
}

// ============================================================================
// Handlers
// ============================================================================

/// List emergency contacts.
#[utoipa::path(
    get,
    path = "/api/emergency/contacts",
    tag = "emergency",
    operation_id = "listEmergencyContacts",
    summary = "List emergency contacts",
    responses(
        (status = 200, description = "Contacts retrieved", body = ContactsResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn list_contacts(State(state): State<SharedState>) -> ApiResult<Json<ContactsResponse>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;

    let contacts = state_guard.emergency.contacts().to_vec();
    Ok(Json(ContactsResponse {
        total: contacts.len(),
        contacts,
    }))
}

/// Send an emergency alert.
#[utoipa::path(
    post,
    path = "/api/emergency/alert",
    tag = "emergency",
    operation_id = "sendEmergencyAlert",
    summary = "Send an emergency alert",
    description = "Notifies every emergency contact. The current location is \
        included only while location sharing is on.",
    responses(
        (status = 200, description = "Alert sent", body = AlertResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Emergency alerts are turned off", body = ErrorResponse)
    )
)]
pub async fn send_alert(State(state): State<SharedState>) -> ApiResult<Json<AlertResponse>> {
    let mut state_guard = state.write().await;
    require_authenticated(&state_guard)?;

    let settings = state_guard.settings;
    let location = settings
        .location_sharing
        .then(|| state_guard.navigation.current_location());
    let alert = state_guard
        .emergency
        .send_alert(location, settings.emergency_alerts)?;

    Ok(Json(AlertResponse::new(alert)))
}

/// Call an emergency contact.
#[utoipa::path(
    post,
    path = "/api/emergency/contacts/{id}/call",
    tag = "emergency",
    operation_id = "callEmergencyContact",
    summary = "Call a contact",
    params(("id" = u32, Path, description = "Contact id", example = 1)),
    responses(
        (status = 200, description = "Dial URI", body = CallResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse)
    )
)]
pub async fn call_contact(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<CallResponse>> {
    let state_guard = state.read().await;
    require_authenticated(&state_guard)?;

    let contact = state_guard.emergency.call(id)?.clone();
    Ok(Json(CallResponse {
        dial_uri: contact.dial_uri(),
        contact,
    }))
}
