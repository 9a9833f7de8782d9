//! HTTP service for the visa-application intake flow.
//!
//! Thin axum layer over the `intake-stream` crate: request validation, the
//! SSE relay endpoint, the one-shot extraction endpoint, and the speech
//! convenience.

/// Route handlers and router construction.
pub mod api;
/// Environment-variable configuration.
pub mod config;
/// Request-level error type and HTTP mapping.
pub mod error;
/// Tracing subscriber setup.
pub mod logger;
