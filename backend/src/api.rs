use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt as _;
use serde_json::Value;

use intake_stream::relay::{RelaySignal, relay_signals};
use intake_stream::{ExtractRequest, IntakeProvider, extract_application};

use crate::error::ApiError;

/// Shared handler state: the single upstream provider.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn IntakeProvider>,
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/intake", post(intake))
        .route("/api/intake/stream", post(intake_stream))
        .route("/api/speech", post(speech))
        .with_state(state)
}

/// Body shared by the extraction endpoints.
///
/// Parsed from a raw `Value` so shape mismatches answer 400, not the JSON
/// extractor's 422.
#[derive(Debug, serde::Deserialize)]
struct IntakeRequest {
    #[serde(rename = "userMessage")]
    user_message: String,
}

/// Body for the speech endpoint.
#[derive(Debug, serde::Deserialize)]
struct SpeechRequest {
    text: String,
}

/// Validates the shared request body shape before any upstream call.
fn user_message(body: Value) -> Result<String, ApiError> {
    let request: IntakeRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("userMessage must be a string".into()))?;
    if request.user_message.trim().is_empty() {
        return Err(ApiError::BadRequest("userMessage must not be empty".into()));
    }
    Ok(request.user_message)
}

/// One-shot extraction: `{"userMessage": ...}` in, `{"data": record|null}` out.
///
/// Extraction failure is not an error; it answers with null data.
async fn intake(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let message = user_message(body)?;
    let response = state
        .provider
        .extract_once(ExtractRequest::one_shot(message))
        .await?;
    let data = extract_application(&response).and_then(|record| serde_json::to_value(record).ok());
    Ok(Json(serde_json::json!({ "data": data })))
}

/// Streaming extraction: relays upstream events as SSE data frames.
async fn intake_stream(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let message = user_message(body)?;
    let handle = state
        .provider
        .start_stream(ExtractRequest::streaming(message))
        .await?;

    let events = relay_signals(handle).map(|signal| -> Result<Event, Infallible> {
        Ok(match signal {
            RelaySignal::Frame(frame) => {
                let json = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
                Event::default().data(json)
            }
            RelaySignal::End => Event::default().event("end"),
            RelaySignal::Error => Event::default().event("error"),
        })
    });

    let mut response = Sse::new(events).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(response)
}

/// Reads question text aloud via the provider's text-to-speech collaborator.
async fn speech(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let request: SpeechRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("text must be a string".into()))?;
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".into()));
    }
    let audio = state.provider.synthesize_speech(&request.text).await?;
    Ok(([(CONTENT_TYPE, audio.content_type())], audio.bytes).into_response())
}
