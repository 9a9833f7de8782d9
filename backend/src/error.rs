use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Request-level failures surfaced to HTTP clients.
///
/// Upstream detail never reaches the response body; it is logged server-side
/// when the error is converted.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request body, rejected before any upstream call.
    #[error("{0}")]
    BadRequest(String),
    /// The upstream provider call failed.
    #[error("upstream provider failed")]
    Upstream(#[source] intake_stream::ProviderError),
}

impl From<intake_stream::ProviderError> for ApiError {
    fn from(err: intake_stream::ProviderError) -> Self {
        error!(provider = %err.provider_id(), %err, "upstream provider call failed");
        Self::Upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream provider failed".to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
