//! OpenAI-backed provider integration.
//!
//! Vendor-specific configuration lives here so the rest of the crate can stay
//! provider-agnostic behind the `IntakeProvider` trait.
mod adapter;
mod config;
pub(crate) mod transport;

pub use adapter::OpenAiProvider;
pub use config::OpenAiClientConfig;
