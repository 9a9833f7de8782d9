//! Common imports for typical usage.
//!
//! This module intentionally exports the most frequently used session and
//! wire types so application code needs fewer import lines.
pub use crate::{
    AbortHandle, IntakeClient, IntakeError, IntakeProvider, IntakeStream, ProviderError,
    ProviderId, RelayFrame, RelaySignal, StreamUpdate, UpstreamEvent, UpstreamStreamHandle,
    VisaApplication,
};
