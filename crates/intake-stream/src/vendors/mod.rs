//! Vendor-specific provider integrations.
pub mod openai;
