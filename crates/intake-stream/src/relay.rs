//! Server-side relay session: upstream provider events in, SSE-ready
//! signals out.
//!
//! The session is a small state machine over {Open, Finalizing, Closed}
//! driven by {message, finalMessage, end, error}, so frame ordering does not
//! depend on implicit callback-ordering guarantees from the provider client.
//! A `final` frame, when sent, is always the last data frame before `end`.

use futures::StreamExt as _;
use futures::stream;
use tracing::{error, warn};

use crate::event::{RelayFrame, UpstreamEvent};
use crate::extract::extract_application;
use crate::provider::UpstreamStreamHandle;

/// One output of a relay session, ready for SSE encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum RelaySignal {
    /// Serialize as one `data: <json>` frame (no event-name line).
    Frame(RelayFrame),
    /// Emit a bare `event: end` line and close the response.
    End,
    /// Emit a bare `event: error` line and close the response.
    ///
    /// The underlying upstream error is logged server-side and never included
    /// in the frame body.
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Open,
    Finalizing,
    Closed,
}

/// Turns one upstream subscription into the ordered downstream signals.
///
/// Every upstream `message` is wrapped verbatim; the `finalMessage` goes
/// through record extraction and becomes a `final` frame carrying the record
/// or null; stream end and stream error become the matching terminal signal,
/// after which the stream is closed.
pub fn relay_signals(handle: UpstreamStreamHandle) -> impl futures::Stream<Item = RelaySignal> + Send {
    struct Session {
        upstream: crate::provider::UpstreamEventStream,
        phase: Phase,
    }

    stream::unfold(
        Session {
            upstream: handle.stream,
            phase: Phase::Open,
        },
        |mut session| async move {
            loop {
                if session.phase == Phase::Closed {
                    return None;
                }
                match session.upstream.next().await {
                    Some(Ok(UpstreamEvent::Message { payload })) => {
                        if session.phase == Phase::Finalizing {
                            // The final frame has been emitted; late incremental
                            // events would break the final-before-end ordering.
                            warn!("dropping upstream message after final frame");
                            continue;
                        }
                        return Some((RelaySignal::Frame(RelayFrame::Message { payload }), session));
                    }
                    Some(Ok(UpstreamEvent::FinalMessage { response })) => {
                        if session.phase == Phase::Finalizing {
                            warn!("dropping duplicate upstream final message");
                            continue;
                        }
                        session.phase = Phase::Finalizing;
                        let data = extract_application(&response)
                            .and_then(|record| serde_json::to_value(record).ok());
                        return Some((RelaySignal::Frame(RelayFrame::Final { data }), session));
                    }
                    Some(Err(err)) => {
                        error!(provider = %err.provider_id(), %err, "upstream session failed");
                        session.phase = Phase::Closed;
                        return Some((RelaySignal::Error, session));
                    }
                    None => {
                        session.phase = Phase::Closed;
                        return Some((RelaySignal::End, session));
                    }
                }
            }
        },
    )
}
