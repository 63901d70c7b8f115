use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Unsupported address: {0}")]
    UnsupportedAddress(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Store write failed: {0}")]
    StoreWriteFailure(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl InventoryError {
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        InventoryError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors raised before the store was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            InventoryError::MissingRequiredField(_) | InventoryError::InvalidValue { .. }
        )
    }
}

// Convert InventoryError to an HTTP response
impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            InventoryError::UnsupportedAddress(_) => (StatusCode::NOT_FOUND, self.to_string()),
            InventoryError::MissingRequiredField(_) | InventoryError::InvalidValue { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            InventoryError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            InventoryError::StoreWriteFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Store write failed".into())
            }
            InventoryError::Database(_) | InventoryError::UnsupportedSchemaVersion { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".into())
            }
            InventoryError::WebSocket(_) => (StatusCode::INTERNAL_SERVER_ERROR, "WebSocket error".into()),
        };

        if status.is_server_error() {
            tracing::error!(?self);
        } else if self.is_validation() {
            tracing::info!(%self, "book rejected by validation");
        } else {
            tracing::warn!(%self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::BadRequest(err.to_string())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_unprocessable() {
        let missing = InventoryError::MissingRequiredField("title");
        assert!(missing.is_validation());
        assert_eq!(missing.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bad_request = InventoryError::BadRequest("unknown field `isbn`".into());
        assert!(!bad_request.is_validation());
        assert_eq!(bad_request.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn closed_sockets_are_server_errors() {
        let error = InventoryError::WebSocket("connection closed".into());
        assert!(!error.is_validation());
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
