//! JSON error envelope returned by every non-streaming failure.
//!
//! ```json
//! { "error": { "message": "unknown service: redis", "type": "invalid_request_error", "code": "service_not_found" } }
//! ```

use crate::gateway::GatewayError;
use crate::services::ServiceIdError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response wrapper.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create a bad request error (400).
    pub fn bad_request(message: &str) -> Self {
        Self::new(message, "invalid_request_error", "invalid_request_error")
    }

    /// Create a service not found error (404).
    pub fn service_not_found(service: &str) -> Self {
        Self::new(
            &format!("unknown service: {}", service),
            "invalid_request_error",
            "service_not_found",
        )
    }

    /// Create a bad gateway error (502).
    pub fn bad_gateway(message: &str) -> Self {
        Self::new(message, "server_error", "bad_gateway")
    }

    /// Generic upstream failure. Details stay in the server log.
    pub fn upstream_error() -> Self {
        Self::bad_gateway("Upstream error")
    }

    fn new(message: &str, r#type: &str, code: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: r#type.to_string(),
                code: Some(code.to_string()),
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("service_not_found") => StatusCode::NOT_FOUND,
            Some("bad_gateway") => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceIdError> for ApiError {
    fn from(err: ServiceIdError) -> Self {
        match err {
            ServiceIdError::NotManaged(name) => ApiError::service_not_found(&name),
            ServiceIdError::NotToggleable(_) => {
                ApiError::bad_request("Service does not support port toggling")
            }
            other => ApiError::bad_request(&other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::bad_gateway(&err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
