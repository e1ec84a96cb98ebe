//! API error types and response handling.
//!
//! Every handler returns [`ApiResult`]; core errors convert through
//! [`SoleMateError`] so the status code and error code come from one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use solemate_core::{
    AccountError, BluetoothError, DetectionError, EmergencyError, NavigationError, SettingsError,
    SoleMateError,
};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error on its way to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    error_code: String,
    message: String,
    details: Option<serde_json::Value>,
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "device_not_connected",
    "message": "Please connect your SoleMate device first",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "auth_wrong_password").
    #[schema(example = "device_not_connected")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "Please connect your SoleMate device first")]
    pub message: String,

    /// Optional additional details. Account failures carry the notice to show.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Builds an error with an explicit status.
    #[must_use]
    pub fn new(
        status: StatusCode,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// The response for routes that need a signed-in principal.
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "not_authenticated",
            "Sign in to use this feature",
        )
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code sent as `error`.
    #[must_use]
    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// Attaches structured details to the body.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                error_code = %self.error_code,
                message = %self.message,
                "Request failed"
            );
        }

        let body = ErrorResponse {
            error: self.error_code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status.canonical_reason() {
            Some(reason) => write!(f, "{reason}: {}", self.message),
            None => write!(f, "{}: {}", self.status.as_u16(), self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<SoleMateError> for ApiError {
    fn from(err: SoleMateError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.error_code().to_ascii_lowercase(), err.to_string())
    }
}

/// Account failures carry the notice the login and sign-up screens show.
impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let details = serde_json::json!({
            "notice": err.notice(),
            "retryable": err.is_retryable(),
        });
        Self::from(SoleMateError::from(err)).with_details(details)
    }
}

impl From<BluetoothError> for ApiError {
    fn from(err: BluetoothError) -> Self {
        Self::from(SoleMateError::from(err))
    }
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        Self::from(SoleMateError::from(err))
    }
}

impl From<NavigationError> for ApiError {
    fn from(err: NavigationError) -> Self {
        Self::from(SoleMateError::from(err))
    }
}

impl From<EmergencyError> for ApiError {
    fn from(err: EmergencyError) -> Self {
        Self::from(SoleMateError::from(err))
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        Self::from(SoleMateError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solemate_core::{AccountAction, AuthError, ValidationError};

    #[test]
    fn test_display_uses_reason_phrase() {
        let err = ApiError::new(StatusCode::BAD_REQUEST, "test_error", "Test message");
        assert_eq!(err.to_string(), "Bad Request: Test message");
    }

    #[test]
    fn test_not_authenticated() {
        let err = ApiError::not_authenticated();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "not_authenticated");
    }

    #[test]
    fn test_core_errors_map_to_status() {
        let err = ApiError::from(BluetoothError::DeviceNotFound {
            id: "solemate-404".into(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(BluetoothError::Disabled);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(SoleMateError::DeviceNotConnected);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "device_not_connected");
    }

    #[test]
    fn test_account_error_carries_notice() {
        let err = ApiError::from(AccountError::Auth {
            action: AccountAction::SignUp,
            source: AuthError::EmailInUse,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        let details = err.details.unwrap();
        assert_eq!(details["notice"]["title"], "Sign-up Error");
        assert_eq!(details["retryable"], false);

        let err = ApiError::from(AccountError::Invalid(ValidationError::PasswordMismatch));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details.unwrap()["notice"]["title"], "Password Mismatch");
    }

    #[test]
    fn test_network_failure_is_retryable() {
        let err = ApiError::from(AccountError::Auth {
            action: AccountAction::SignIn,
            source: AuthError::NetworkFailed,
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        let details = err.details.unwrap();
        assert_eq!(details["retryable"], true);
        assert_eq!(details["notice"]["title"], "Authentication Error");
    }

    #[test]
    fn test_navigation_and_emergency_errors_map_to_status() {
        let err = ApiError::from(NavigationError::MissingDestination);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "missing_destination");

        let err = ApiError::from(EmergencyError::ContactNotFound(42));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "contact_not_found");
    }

    #[tokio::test]
    async fn test_response_body() {
        let response = ApiError::from(SettingsError::UnknownKey("wifi".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "unknown_setting");
        assert!(body.details.is_none());
    }
}
