//! Heuristics for pulling structured or human-readable content out of
//! opaque, provider-defined payloads.
//!
//! Provider payload shapes vary from release to release, so both heuristics
//! are ordered lists of shape-specific attempts rather than a single parse:
//! the first attempt that produces something wins, and nothing here ever
//! returns an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::VisaApplication;

static BRACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("brace run pattern is valid"));

/// Extracts a validated [`VisaApplication`] from a completed provider
/// response.
///
/// Attempts, in order: the aggregated plain-text output parsed as JSON, an
/// embedded-JSON content block, and finally a scan for the last
/// brace-delimited object in the serialized response. Any parse or
/// validation failure moves on to the next attempt; exhausting all three
/// yields `None`, never an error.
pub fn extract_application(response: &Value) -> Option<VisaApplication> {
    if let Some(record) = aggregated_text(response).as_deref().and_then(parse_validated) {
        return Some(record);
    }
    if let Some(record) = embedded_json_block(response) {
        return Some(record);
    }
    salvage_trailing_object(response)
}

/// Aggregated plain-text output of a response.
///
/// Prefers the text content blocks under `output[*].content[*]`, falling back
/// to a top-level `output_text` convenience field when no blocks carry text.
fn aggregated_text(response: &Value) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(items) = response.get("output").and_then(Value::as_array) {
        for item in items {
            let Some(content) = item.get("content").and_then(Value::as_array) else {
                continue;
            };
            for block in content {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    parts.push(text);
                }
            }
        }
    }
    if !parts.is_empty() {
        return Some(parts.concat());
    }
    response
        .get("output_text")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn embedded_json_block(response: &Value) -> Option<VisaApplication> {
    let items = response.get("output").and_then(Value::as_array)?;
    for item in items {
        let Some(content) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for block in content {
            if !matches!(
                block.get("type").and_then(Value::as_str),
                Some("output_json" | "json")
            ) {
                continue;
            }
            if let Some(record) = block.get("json").and_then(|v| VisaApplication::from_value(v)) {
                return Some(record);
            }
        }
    }
    None
}

/// Last-resort salvage: serialize the whole response and try the last
/// brace-delimited `{...}` run in it.
///
/// Logged loudly when it succeeds so production traffic can show whether this
/// path still gets exercised by current provider responses.
fn salvage_trailing_object(response: &Value) -> Option<VisaApplication> {
    let serialized = response.to_string();
    let candidate = BRACE_RUN.find_iter(&serialized).last()?;
    let record = parse_validated(candidate.as_str())?;
    warn!("structured record recovered via trailing-object salvage scan");
    Some(record)
}

fn parse_validated(text: &str) -> Option<VisaApplication> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    let record = VisaApplication::from_value(&value);
    if record.is_none() {
        debug!("response text did not contain a valid record");
    }
    record
}

type TextExtractor = fn(&Value) -> Option<String>;

/// Shape-specific attempts for the incremental `message` payloads, in fixed
/// priority order.
const MESSAGE_TEXT_EXTRACTORS: &[TextExtractor] = &[
    top_level_delta,
    top_level_text,
    nested_data_text,
    content_block_text,
];

/// Extracts human-readable text from an incremental message payload.
///
/// Returns the empty string when no known shape applies; never errors, so a
/// surprising payload can never poison the transcript.
pub fn message_text(payload: &Value) -> String {
    MESSAGE_TEXT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(payload).filter(|text| !text.is_empty()))
        .unwrap_or_default()
}

fn top_level_delta(payload: &Value) -> Option<String> {
    payload
        .get("delta")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn top_level_text(payload: &Value) -> Option<String> {
    payload
        .get("text")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn nested_data_text(payload: &Value) -> Option<String> {
    payload
        .get("data")?
        .get("text")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn content_block_text(payload: &Value) -> Option<String> {
    let blocks = payload
        .get("response")?
        .get("output")?
        .get(0)?
        .get("content")
        .and_then(Value::as_array)?;
    let mut out = String::new();
    for block in blocks {
        if let Some(text) = block.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
    }
    (!out.is_empty()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json() -> String {
        r#"{"full_name":"Jane Doe","dob":"1991-04-12","passport_number":"AB1234567","nationality":"UK"}"#
            .to_string()
    }

    #[test]
    fn extracts_from_content_block_text() {
        let response = serde_json::json!({
            "output": [{"type": "message", "content": [{"type": "output_text", "text": record_json()}]}]
        });
        let record = extract_application(&response).expect("record");
        assert_eq!(record.full_name, "Jane Doe");
    }

    #[test]
    fn extracts_from_aggregated_output_text() {
        let response = serde_json::json!({ "output_text": record_json() });
        assert!(extract_application(&response).is_some());
    }

    #[test]
    fn extracts_from_embedded_json_block() {
        let response = serde_json::json!({
            "output": [{"content": [{"type": "output_json", "json": {
                "full_name": "Jane Doe",
                "dob": "1991-04-12",
                "passport_number": "AB1234567",
                "nationality": "UK"
            }}]}]
        });
        assert!(extract_application(&response).is_some());
    }

    #[test]
    fn salvages_trailing_object_from_unknown_shape() {
        let response = serde_json::json!({
            "candidates": format!("model said: {}", record_json()),
            "zzz_tail": {
                "full_name": "Jane Doe",
                "dob": "1991-04-12",
                "passport_number": "AB1234567",
                "nationality": "UK"
            }
        });
        assert!(extract_application(&response).is_some());
    }

    #[test]
    fn non_json_text_yields_none_without_panicking() {
        let response = serde_json::json!({ "output_text": "not json" });
        assert_eq!(extract_application(&response), None);
    }

    #[test]
    fn schema_violating_object_yields_none() {
        let response = serde_json::json!({
            "output_text": r#"{"full_name":"Jane Doe","dob":"1991-04-12"}"#
        });
        assert_eq!(extract_application(&response), None);
    }

    #[test]
    fn message_text_prefers_delta() {
        assert_eq!(message_text(&serde_json::json!({"delta": "ab"})), "ab");
    }

    #[test]
    fn message_text_falls_back_to_text() {
        assert_eq!(message_text(&serde_json::json!({"text": "cd"})), "cd");
    }

    #[test]
    fn message_text_reads_nested_data_text() {
        assert_eq!(
            message_text(&serde_json::json!({"data": {"text": "ef"}})),
            "ef"
        );
    }

    #[test]
    fn message_text_concatenates_content_blocks() {
        let payload = serde_json::json!({
            "response": {"output": [{"content": [{"text": "g"}, {"text": "h"}]}]}
        });
        assert_eq!(message_text(&payload), "gh");
    }

    #[test]
    fn message_text_skips_non_string_blocks() {
        let payload = serde_json::json!({
            "response": {"output": [{"content": [{"text": 7}, {"text": "h"}, {}]}]}
        });
        assert_eq!(message_text(&payload), "h");
    }

    #[test]
    fn message_text_of_unknown_shapes_is_empty() {
        assert_eq!(message_text(&serde_json::json!({})), "");
        assert_eq!(message_text(&serde_json::json!(null)), "");
        assert_eq!(message_text(&serde_json::json!({"delta": 5})), "");
    }
}
