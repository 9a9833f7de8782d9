/// Wire-level event relayed to the downstream client as one SSE data frame.
///
/// Termination (`end`/`error`) is signalled with bare SSE `event:` lines, not
/// data frames, so it has no variant here.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RelayFrame {
    /// Opaque incremental payload from the upstream provider.
    Message { payload: serde_json::Value },
    /// Final structured record, or null when extraction failed upstream.
    Final {
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
}

/// Events emitted by an upstream provider streaming session.
///
/// The session ends with either normal stream exhaustion or a stream-level
/// error; both are carried by the surrounding `Result` stream, not here.
#[derive(Clone, Debug, PartialEq)]
pub enum UpstreamEvent {
    /// One incremental event, relayed verbatim.
    Message { payload: serde_json::Value },
    /// The provider's completed response, subject to record extraction.
    FinalMessage { response: serde_json::Value },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frame_serializes_with_event_tag() {
        let frame = RelayFrame::Message {
            payload: serde_json::json!({"delta": "hi"}),
        };
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["event"], "message");
        assert_eq!(value["payload"]["delta"], "hi");
    }

    #[test]
    fn final_frame_serializes_null_data() {
        let frame = RelayFrame::Final { data: None };
        let text = serde_json::to_string(&frame).expect("serialize");
        assert_eq!(text, r#"{"event":"final","data":null}"#);
    }

    #[test]
    fn final_frame_with_missing_data_field_parses_as_null() {
        let frame: RelayFrame = serde_json::from_str(r#"{"event":"final"}"#).expect("parse");
        assert_eq!(frame, RelayFrame::Final { data: None });
    }
}
