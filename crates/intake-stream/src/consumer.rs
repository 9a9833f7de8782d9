//! Client-side consumer of the intake stream.
//!
//! One [`IntakeStream`] exists per outstanding fetch. All observable state
//! (event log, transcript, final record, error) lives on the session and is
//! mutated only from `next_update`, so the read path is a single sequential
//! suspend-resume cycle with no shared-state races.

use std::pin::Pin;

use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use crate::application::VisaApplication;
use crate::errors::IntakeError;
use crate::event::RelayFrame;
use crate::extract::message_text;
use crate::sse::{SseDecoder, data_payload};

/// Error message surfaced for any mid-stream transport failure.
///
/// Deliberately generic: upstream diagnostics never reach the transcript.
pub const STREAM_ERROR_MESSAGE: &str = "stream connection failed";

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Handle used to request cancellation of a live stream.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// The read loop terminates promptly without surfacing an error;
    /// transcript, event log, and record state are left as they were.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// One state change observed by the consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamUpdate {
    /// A parsed wire frame (already applied to the session state).
    Frame(RelayFrame),
    /// The transport failed mid-stream; accumulated state is preserved.
    TransportFailed,
    /// The stream ended normally.
    Closed,
}

/// Client for the intake service.
///
/// Owns the HTTP client and at most one live streaming session: starting a
/// new stream cancels and discards the previous one, so two read loops can
/// never race on transcript state.
pub struct IntakeClient {
    http: reqwest::Client,
    base_url: String,
    active: Option<AbortHandle>,
}

impl IntakeClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, IntakeError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| IntakeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            active: None,
        })
    }

    /// Submits a message to the non-streaming endpoint.
    ///
    /// Returns the extracted record, or `None` when the service answered with
    /// `{"data": null}`.
    pub async fn extract(&self, user_message: &str) -> Result<Option<VisaApplication>, IntakeError> {
        validate_message(user_message)?;
        let response = self
            .http
            .post(format!("{}/api/intake", self.base_url))
            .json(&serde_json::json!({ "userMessage": user_message }))
            .send()
            .await
            .map_err(|e| IntakeError::Transport(format!("intake request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::Transport(format!(
                "intake request failed with status {status}"
            )));
        }
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| IntakeError::Transport(format!("invalid intake response: {e}")))?;
        Ok(body.get("data").and_then(VisaApplication::from_value))
    }

    /// Opens a streaming session for the message.
    ///
    /// Any previous session of this client is cancelled first.
    pub async fn start_stream(&mut self, user_message: &str) -> Result<IntakeStream, IntakeError> {
        validate_message(user_message)?;
        if let Some(previous) = self.active.take() {
            previous.abort();
        }

        let response = self
            .http
            .post(format!("{}/api/intake/stream", self.base_url))
            .json(&serde_json::json!({ "userMessage": user_message }))
            .send()
            .await
            .map_err(|e| IntakeError::Transport(format!("stream request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IntakeError::Transport(format!(
                "stream request failed with status {status}"
            )));
        }

        let stream = IntakeStream::spawn(Box::pin(response.bytes_stream()));
        self.active = Some(stream.abort_handle());
        Ok(stream)
    }
}

fn validate_message(user_message: &str) -> Result<(), IntakeError> {
    if user_message.trim().is_empty() {
        return Err(IntakeError::Validation(
            "user message must not be empty".into(),
        ));
    }
    Ok(())
}

/// One live streaming session and its accumulated state.
#[derive(Debug)]
pub struct IntakeStream {
    session_id: uuid::Uuid,
    rx: mpsc::Receiver<StreamUpdate>,
    abort: AbortHandle,
    events: Vec<RelayFrame>,
    transcript: String,
    record: Option<VisaApplication>,
    error: Option<String>,
    closed: bool,
}

impl IntakeStream {
    pub(crate) fn spawn(bytes: ByteStream) -> Self {
        let session_id = uuid::Uuid::new_v4();
        let (tx, rx) = mpsc::channel(64);
        let (abort_tx, abort_rx) = watch::channel(false);
        tokio::spawn(read_task(session_id, bytes, tx, abort_rx));
        Self {
            session_id,
            rx,
            abort: AbortHandle { tx: abort_tx },
            events: Vec::new(),
            transcript: String::new(),
            record: None,
            error: None,
            closed: false,
        }
    }

    /// Returns the session id for this stream.
    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    /// Returns a handle that can cancel the stream.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Waits for the next state change and applies it.
    ///
    /// Returns `None` once the read loop has finished, whether by normal end,
    /// transport failure, or cancellation.
    pub async fn next_update(&mut self) -> Option<StreamUpdate> {
        let update = self.rx.recv().await?;
        self.apply(&update);
        Some(update)
    }

    /// Drives the stream to completion.
    pub async fn run_to_end(&mut self) {
        while self.next_update().await.is_some() {}
    }

    /// Ordered log of every parsed event.
    pub fn events(&self) -> &[RelayFrame] {
        &self.events
    }

    /// Transcript accumulated from `message` payloads, in arrival order.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Latest final record; `None` until a non-null `final` frame arrives.
    pub fn record(&self) -> Option<&VisaApplication> {
        self.record.as_ref()
    }

    /// Generic stream-error message, set only by mid-stream transport failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the stream ended normally.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn apply(&mut self, update: &StreamUpdate) {
        match update {
            StreamUpdate::Frame(frame) => {
                self.events.push(frame.clone());
                match frame {
                    RelayFrame::Message { payload } => {
                        let text = message_text(payload);
                        if !text.is_empty() {
                            self.transcript.push_str(&text);
                        }
                    }
                    RelayFrame::Final { data } => {
                        // Wholesale replacement, never a merge; schema
                        // violations count as no result.
                        self.record = data.as_ref().and_then(VisaApplication::from_value);
                    }
                }
            }
            StreamUpdate::TransportFailed => {
                self.error = Some(STREAM_ERROR_MESSAGE.to_string());
            }
            StreamUpdate::Closed => {
                self.closed = true;
            }
        }
    }
}

async fn read_task(
    session_id: uuid::Uuid,
    mut bytes: ByteStream,
    tx: mpsc::Sender<StreamUpdate>,
    mut abort_rx: watch::Receiver<bool>,
) {
    let mut decoder = SseDecoder::default();
    loop {
        tokio::select! {
            changed = abort_rx.changed() => {
                match changed {
                    // Cancellation is not an error: exit without an update so
                    // no error state is ever populated.
                    Ok(_) if *abort_rx.borrow() => return,
                    Ok(_) => {}
                    // Sender dropped: the session is gone, stop reading.
                    Err(_) => return,
                }
            }
            next = bytes.next() => {
                match next {
                    Some(Ok(chunk)) => {
                        for frame in decoder.push_chunk(&chunk) {
                            let Some(payload) = data_payload(&frame) else {
                                continue;
                            };
                            match serde_json::from_str::<RelayFrame>(&payload) {
                                Ok(frame) => {
                                    if tx.send(StreamUpdate::Frame(frame)).await.is_err() {
                                        return;
                                    }
                                }
                                Err(err) => {
                                    debug!(%session_id, %err, "dropping malformed stream frame");
                                }
                            }
                        }
                    }
                    Some(Err(err)) => {
                        error!(%session_id, %err, "intake stream read failed");
                        let _ = tx.send(StreamUpdate::TransportFailed).await;
                        return;
                    }
                    None => {
                        let _ = tx.send(StreamUpdate::Closed).await;
                        return;
                    }
                }
            }
        }
    }
}
