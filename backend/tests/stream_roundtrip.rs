//! Serves the real router on an ephemeral listener with a scripted provider
//! and drives it end to end with the library's consumer client.

use std::sync::Arc;

use futures::stream;

use backend::api::{AppState, router};
use intake_stream::provider::{
    ExtractRequest, IntakeProvider, ProviderId, SpeechAudio, UpstreamStreamHandle,
};
use intake_stream::{IntakeClient, IntakeError, ProviderError, UpstreamEvent};

#[derive(Clone)]
struct ScriptedProvider {
    events: Vec<Result<UpstreamEvent, ProviderError>>,
    one_shot_response: serde_json::Value,
}

impl ScriptedProvider {
    fn with_events(events: Vec<Result<UpstreamEvent, ProviderError>>) -> Self {
        Self {
            events,
            one_shot_response: serde_json::json!({}),
        }
    }

    fn with_one_shot(response: serde_json::Value) -> Self {
        Self {
            events: Vec::new(),
            one_shot_response: response,
        }
    }
}

#[async_trait::async_trait]
impl IntakeProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new("scripted")
    }

    async fn extract_once(&self, _req: ExtractRequest) -> Result<serde_json::Value, ProviderError> {
        Ok(self.one_shot_response.clone())
    }

    async fn start_stream(
        &self,
        _req: ExtractRequest,
    ) -> Result<UpstreamStreamHandle, ProviderError> {
        Ok(UpstreamStreamHandle {
            stream: Box::pin(stream::iter(self.events.clone())),
        })
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<SpeechAudio, ProviderError> {
        Ok(SpeechAudio {
            bytes: bytes::Bytes::from_static(b"fake-mp3-bytes"),
            format: "mp3".to_string(),
        })
    }
}

async fn serve(provider: ScriptedProvider) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("local addr");
    let app = router(AppState {
        provider: Arc::new(provider),
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn record_value() -> serde_json::Value {
    serde_json::json!({
        "full_name": "Jane Doe",
        "dob": "1991-04-12",
        "passport_number": "AB1234567",
        "nationality": "UK"
    })
}

#[tokio::test]
async fn jane_doe_scenario_streams_transcript_and_record() {
    let provider = ScriptedProvider::with_events(vec![
        Ok(UpstreamEvent::Message {
            payload: serde_json::json!({"delta": "Jane"}),
        }),
        Ok(UpstreamEvent::Message {
            payload: serde_json::json!({"delta": " Doe"}),
        }),
        Ok(UpstreamEvent::FinalMessage {
            response: serde_json::json!({"output_text": record_value().to_string()}),
        }),
    ]);
    let base_url = serve(provider).await;

    let mut client = IntakeClient::new(&base_url).expect("client");
    let mut session = client
        .start_stream("I am Jane Doe, born 1991-04-12, passport AB1234567, nationality UK.")
        .await
        .expect("start stream");
    session.run_to_end().await;

    assert_eq!(session.transcript(), "Jane Doe");
    assert_eq!(session.events().len(), 3);
    let record = session.record().expect("final record");
    assert_eq!(record.full_name, "Jane Doe");
    assert_eq!(record.passport_number, "AB1234567");
    assert!(session.error().is_none());
    assert!(session.is_closed());
}

#[tokio::test]
async fn upstream_error_closes_stream_without_leaking_detail() {
    let provider = ScriptedProvider::with_events(vec![
        Ok(UpstreamEvent::Message {
            payload: serde_json::json!({"delta": "J"}),
        }),
        Err(ProviderError::transport("scripted", "socket reset by peer")),
    ]);
    let base_url = serve(provider).await;

    // Raw read: the error must arrive as a bare `event: error` line whose
    // body never contains the upstream diagnostic.
    let raw = reqwest::Client::new()
        .post(format!("{base_url}/api/intake/stream"))
        .json(&serde_json::json!({"userMessage": "hello"}))
        .send()
        .await
        .expect("request")
        .text()
        .await
        .expect("body");
    assert!(raw.contains("event: error"));
    assert!(!raw.contains("socket reset"));

    // Consumer view: accumulated state survives, no error state is set for a
    // cleanly delivered error event.
    let mut client = IntakeClient::new(&base_url).expect("client");
    let mut session = client.start_stream("hello").await.expect("start stream");
    session.run_to_end().await;
    assert_eq!(session.transcript(), "J");
    assert_eq!(session.events().len(), 1);
    assert!(session.record().is_none());
}

#[tokio::test]
async fn stream_response_carries_sse_headers() {
    let provider = ScriptedProvider::with_events(Vec::new());
    let base_url = serve(provider).await;

    let response = reqwest::Client::new()
        .post(format!("{base_url}/api/intake/stream"))
        .json(&serde_json::json!({"userMessage": "hello"}))
        .send()
        .await
        .expect("request");
    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
    assert_eq!(
        headers.get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-cache, no-transform")
    );
}

#[tokio::test]
async fn malformed_request_bodies_are_rejected_with_400() {
    let provider = ScriptedProvider::with_events(Vec::new());
    let base_url = serve(provider).await;
    let http = reqwest::Client::new();

    for body in [
        serde_json::json!({}),
        serde_json::json!({"userMessage": 42}),
        serde_json::json!({"userMessage": "   "}),
    ] {
        for path in ["/api/intake", "/api/intake/stream"] {
            let status = http
                .post(format!("{base_url}{path}"))
                .json(&body)
                .send()
                .await
                .expect("request")
                .status();
            assert_eq!(status.as_u16(), 400, "body {body} on {path}");
        }
    }
}

#[tokio::test]
async fn client_rejects_empty_message_before_any_request() {
    let mut client = IntakeClient::new("http://127.0.0.1:9").expect("client");
    let err = client.start_stream("  ").await.expect_err("should reject");
    assert!(matches!(err, IntakeError::Validation(_)));
}

#[tokio::test]
async fn one_shot_with_unparseable_text_answers_null_data() {
    let provider = ScriptedProvider::with_one_shot(serde_json::json!({"output_text": "not json"}));
    let base_url = serve(provider).await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{base_url}/api/intake"))
        .json(&serde_json::json!({"userMessage": "hello"}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");
    assert_eq!(body, serde_json::json!({"data": null}));

    let client = IntakeClient::new(&base_url).expect("client");
    let record = client.extract("hello").await.expect("extract");
    assert!(record.is_none());
}

#[tokio::test]
async fn one_shot_with_valid_record_answers_data() {
    let provider = ScriptedProvider::with_one_shot(
        serde_json::json!({"output_text": record_value().to_string()}),
    );
    let base_url = serve(provider).await;

    let client = IntakeClient::new(&base_url).expect("client");
    let record = client.extract("hello").await.expect("extract").expect("record");
    assert_eq!(record.nationality, "UK");
}

#[tokio::test]
async fn speech_endpoint_returns_audio_bytes() {
    let provider = ScriptedProvider::with_events(Vec::new());
    let base_url = serve(provider).await;

    let response = reqwest::Client::new()
        .post(format!("{base_url}/api/speech"))
        .json(&serde_json::json!({"text": "What is your passport number?"}))
        .send()
        .await
        .expect("request");
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("audio/mpeg")
    );
    let bytes = response.bytes().await.expect("bytes");
    assert_eq!(&bytes[..], b"fake-mp3-bytes");

    let status = reqwest::Client::new()
        .post(format!("{base_url}/api/speech"))
        .json(&serde_json::json!({"text": ""}))
        .send()
        .await
        .expect("request")
        .status();
    assert_eq!(status.as_u16(), 400);
}
