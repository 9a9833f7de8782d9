//! Streaming core for the visa-application intake service.
//!
//! The crate has two halves around one wire protocol: the server-side relay
//! (`relay`), which forwards an upstream provider's incremental events as SSE
//! data frames and closes with a `final` record, and the client-side consumer
//! (`consumer`), which reassembles those frames from arbitrary byte chunks
//! into an event log, a transcript, and a validated [`VisaApplication`].
//!
//! Vendor-specific integrations are namespaced under `vendors::*`.
//!
//! # Consumer usage
//!
//! ```no_run
//! use intake_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), IntakeError> {
//! let mut client = IntakeClient::new("http://localhost:8080")?;
//! let mut stream = client
//!     .start_stream("I am Jane Doe, born 1991-04-12, passport AB1234567, nationality UK.")
//!     .await?;
//!
//! while let Some(update) = stream.next_update().await {
//!     if let StreamUpdate::Frame(RelayFrame::Message { .. }) = update {
//!         println!("transcript so far: {}", stream.transcript());
//!     }
//! }
//!
//! if let Some(record) = stream.record() {
//!     println!("passport: {}", record.passport_number);
//! }
//! # Ok(())
//! # }
//! ```

/// Structured visa-application record and its generation schema.
pub mod application;
/// Client-side stream consumer: session state, read loop, cancellation.
pub mod consumer;
/// Public error types.
pub mod errors;
/// Wire-level and upstream event unions.
pub mod event;
/// Record-extraction and transcript-text heuristics.
pub mod extract;
/// Common imports for typical usage.
pub mod prelude;
/// System instructions for the extraction calls.
pub mod prompt;
/// Provider adapter contract and request types.
pub mod provider;
/// Server-side relay session state machine.
pub mod relay;
/// Buffered SSE framing.
pub mod sse;
/// Vendor-specific provider integrations.
pub mod vendors;

pub use application::VisaApplication;
pub use consumer::{AbortHandle, IntakeClient, IntakeStream, STREAM_ERROR_MESSAGE, StreamUpdate};
pub use errors::{IntakeError, ProviderError};
pub use event::{RelayFrame, UpstreamEvent};
pub use extract::{extract_application, message_text};
pub use provider::{
    ExtractRequest, IntakeProvider, ProviderId, SpeechAudio, UpstreamEventStream,
    UpstreamStreamHandle,
};
pub use relay::{RelaySignal, relay_signals};
pub use sse::SseDecoder;
