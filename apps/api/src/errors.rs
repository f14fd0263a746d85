use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Error bodies are a flat `{"error": message}` — the shape the frontend's
/// toast layer expects.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The chat-completion API answered with a non-2xx status.
    /// The upstream status is passed through to the client.
    #[error("Error calling {provider} API (status {status})")]
    Upstream { provider: &'static str, status: u16 },

    /// The model reply carried no parseable terms object.
    #[error("Error parsing {provider} response")]
    ReplyParse { provider: &'static str },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream { provider, status } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                format!("Error calling {provider} API"),
            ),
            AppError::ReplyParse { provider } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error parsing {provider} response"),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
