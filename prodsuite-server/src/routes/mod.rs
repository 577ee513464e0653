pub mod admin;
pub mod drawings;
pub mod folders;
pub mod health;
pub mod journals;
pub mod lists;
pub mod notes;
pub mod push;
pub mod settings;
pub mod trackers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use prodsuite_core::SuiteError;
use prodsuite_core::permissions::Feature;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// `{ "message": ... }` body for deletes and other acknowledgements.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

/// An error answered as `{ "error": message, ...details }`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    details: Map<String, Value>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        AppError {
            status,
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Extra top-level field next to `error`.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn access_denied(feature: Feature) -> Self {
        Self::forbidden("Access denied")
            .with(
                "message",
                "You do not have permission to access this feature. \
                 Please request access from an administrator.",
            )
            .with("feature", feature.as_str())
    }

    pub fn admin_required() -> Self {
        Self::forbidden("Admin access required")
            .with("message", "This action requires administrator privileges.")
    }

    pub fn push_not_configured() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Push notifications not configured")
            .with("configured", false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(self.message));
        body.extend(self.details);
        (self.status, Json(Value::Object(body))).into_response()
    }
}

impl From<SuiteError> for AppError {
    fn from(err: SuiteError) -> Self {
        match err {
            SuiteError::Validation(message) | SuiteError::Conflict(message) => {
                AppError::bad_request(message)
            }
            SuiteError::InvalidId(_) => AppError::bad_request(err.to_string()),
            SuiteError::NotFound(_) => AppError::new(StatusCode::NOT_FOUND, err.to_string()),
            SuiteError::Forbidden(message) => AppError::forbidden(message),
            SuiteError::InvalidFeatures(invalid) => AppError::bad_request("Invalid features")
                .with("invalidFeatures", json!(invalid))
                .with("validFeatures", json!(Feature::ALL)),
            other => AppError::internal(other.to_string()),
        }
    }
}
