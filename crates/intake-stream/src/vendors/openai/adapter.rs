use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::{IntakeError, ProviderError};
use crate::provider::{
    ExtractRequest, IntakeProvider, ProviderId, SpeechAudio, UpstreamStreamHandle,
};
use crate::sse::{SseDecoder, frame_data_lines};

use super::config::OpenAiClientConfig;
use super::transport::map_response_data;

const OPENAI_PROVIDER: &str = "openai";
const SPEECH_FORMAT: &str = "mp3";

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Provider backed by OpenAI's Responses API and speech endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiClientConfig,
}

impl OpenAiProvider {
    /// Creates a provider from explicit client configuration.
    pub fn new(config: OpenAiClientConfig) -> Result<Self, IntakeError> {
        if config.api_key.trim().is_empty() {
            return Err(IntakeError::Config(
                "OpenAI client config api_key must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IntakeError::Config(format!("failed to build OpenAI client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a provider using `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, IntakeError> {
        Self::new(OpenAiClientConfig::from_env()?)
    }

    async fn send_responses_request(
        &self,
        req: &ExtractRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let provider_id = ProviderId::new(OPENAI_PROVIDER);
        let body = build_request_body(req, &self.config.model, stream);
        let response = self
            .client
            .post(self.config.responses_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::transport(provider_id.clone(), format!("OpenAI request failed: {e}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::provider(
                provider_id,
                format!("OpenAI responses request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl IntakeProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(OPENAI_PROVIDER)
    }

    async fn extract_once(&self, req: ExtractRequest) -> Result<serde_json::Value, ProviderError> {
        debug!(model = %self.config.model, "one-shot OpenAI extraction");
        let response = self.send_responses_request(&req, false).await?;
        response.json().await.map_err(|e| {
            ProviderError::protocol(
                OPENAI_PROVIDER,
                format!("OpenAI response body was not JSON: {e}"),
            )
        })
    }

    async fn start_stream(&self, req: ExtractRequest) -> Result<UpstreamStreamHandle, ProviderError> {
        debug!(model = %self.config.model, "starting OpenAI responses stream");
        let response = self.send_responses_request(&req, true).await?;
        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        let stream = upstream_event_stream(ProviderId::new(OPENAI_PROVIDER), bytes_stream);
        Ok(UpstreamStreamHandle {
            stream: Box::pin(stream),
        })
    }

    async fn synthesize_speech(&self, text: &str) -> Result<SpeechAudio, ProviderError> {
        let provider_id = ProviderId::new(OPENAI_PROVIDER);
        let body = serde_json::json!({
            "model": self.config.speech_model,
            "voice": self.config.voice,
            "input": text,
            "response_format": SPEECH_FORMAT,
        });
        let response = self
            .client
            .post(self.config.speech_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::transport(provider_id.clone(), format!("OpenAI speech request failed: {e}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::provider(
                provider_id,
                format!("OpenAI speech request failed with status {status}"),
                Some(status.as_u16()),
            ));
        }
        let bytes = response.bytes().await.map_err(|e| {
            ProviderError::transport(
                OPENAI_PROVIDER,
                format!("OpenAI speech body read failed: {e}"),
            )
        })?;
        Ok(SpeechAudio {
            bytes,
            format: SPEECH_FORMAT.to_string(),
        })
    }
}

pub(crate) fn build_request_body(
    req: &ExtractRequest,
    model: &str,
    stream: bool,
) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "input": [
            { "role": "system", "content": req.system_prompt },
            { "role": "user", "content": req.user_message },
        ],
        "stream": stream,
        "store": false,
        "text": {
            "format": {
                "type": "json_schema",
                "name": "visa_application",
                "strict": true,
                "schema": req.schema,
            }
        },
    })
}

fn upstream_event_stream(
    provider_id: ProviderId,
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<crate::event::UpstreamEvent, ProviderError>> + Send {
    struct State {
        provider_id: ProviderId,
        bytes_stream: ByteStream,
        decoder: SseDecoder,
        pending: VecDeque<crate::event::UpstreamEvent>,
        done: bool,
    }

    stream::try_unfold(
        State {
            provider_id,
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.push_chunk(&chunk) {
                            let Some(data) = frame_data_lines(&frame) else {
                                continue;
                            };
                            let events = map_response_data(&state.provider_id, &data)?;
                            state.pending.extend(events);
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        return Err(ProviderError::transport(
                            state.provider_id,
                            format!("OpenAI streaming read failed: {e}"),
                        ));
                    }
                    None => {
                        state.done = true;
                    }
                }
            }
        },
    )
}
