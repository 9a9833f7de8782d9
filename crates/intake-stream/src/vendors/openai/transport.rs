use crate::errors::ProviderError;
use crate::event::UpstreamEvent;
use crate::provider::ProviderId;

/// Maps one decoded SSE data payload from the Responses API to upstream
/// events.
///
/// Incremental events are relayed verbatim as `Message` payloads;
/// `response.completed` carries the final message; failure events become the
/// session's terminal error. `[DONE]` markers and empty payloads map to
/// nothing.
pub(crate) fn map_response_data(
    provider: &ProviderId,
    data: &str,
) -> Result<Vec<UpstreamEvent>, ProviderError> {
    let trimmed = data.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
        ProviderError::protocol(provider.clone(), format!("invalid SSE JSON frame: {e}"))
    })?;
    let Some(event_type) = value.get("type").and_then(|v| v.as_str()) else {
        return Ok(Vec::new());
    };
    match event_type {
        "response.completed" => {
            let response = value.get("response").cloned().unwrap_or(value);
            Ok(vec![UpstreamEvent::FinalMessage { response }])
        }
        "response.error" | "response.failed" => {
            let message = value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .or_else(|| value.get("message").and_then(|v| v.as_str()))
                .unwrap_or("OpenAI stream error");
            Err(ProviderError::provider(provider.clone(), message, None))
        }
        _ => Ok(vec![UpstreamEvent::Message { payload: value }]),
    }
}
