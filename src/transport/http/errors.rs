use crate::domain::error::BrokerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// HTTP face of [`BrokerError`].
pub struct ApiError(pub BrokerError);

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            BrokerError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("missing_{field}"),
                self.0.to_string(),
            ),
            BrokerError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error".to_string(),
                msg.clone(),
            ),
            BrokerError::InvalidPayload(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_payload".to_string(),
                msg.clone(),
            ),
            BrokerError::WebhookSignature(msg) => {
                tracing::warn!("webhook rejected: {msg}");
                (
                    StatusCode::BAD_REQUEST,
                    "webhook_error".to_string(),
                    msg.clone(),
                )
            }
            BrokerError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found".to_string(),
                msg.clone(),
            ),
            BrokerError::Inconsistency(msg) => {
                tracing::error!("inconsistent state: {msg}");
                (
                    StatusCode::CONFLICT,
                    "inconsistent_state".to_string(),
                    msg.clone(),
                )
            }
            BrokerError::Provider(msg) => {
                tracing::error!("provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error".to_string(),
                    msg.clone(),
                )
            }
            BrokerError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    "internal error".to_string(),
                )
            }
            BrokerError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
