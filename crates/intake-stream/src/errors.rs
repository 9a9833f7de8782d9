use crate::provider::ProviderId;

/// Failure of an upstream extraction or speech call, labeled with the
/// provider it came from.
///
/// The three variants separate what the relay can do about a failure: a
/// `Provider` error came back over a working connection, `Transport` means
/// the connection itself broke, and `Protocol` means the provider answered
/// something this crate cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected or failed the call (bad key, quota, 5xx).
    #[error("provider error ({provider}): {message}")]
    Provider {
        provider: ProviderId,
        message: String,
        status_code: Option<u16>,
    },
    /// The HTTP request or the byte stream behind it failed.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },
    /// The provider's response could not be decoded as the expected events.
    #[error("protocol error ({provider}): {message}")]
    Protocol {
        provider: ProviderId,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(
        provider: impl Into<ProviderId>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    pub fn transport(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn protocol(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Which provider produced this error, for log labels.
    pub fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Provider { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Protocol { provider, .. } => provider,
        }
    }

    /// The message, without the variant framing.
    pub fn message(&self) -> &str {
        match self {
            Self::Provider { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. } => message,
        }
    }
}

/// Top-level error type for the public client-side API.
///
/// Failures after a stream has started are not errors from the caller's point
/// of view: they surface through the session's error state instead, so that
/// any transcript accumulated so far is preserved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    /// Invalid client or provider configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid user input, rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),
    /// Request failed before a stream was established.
    #[error("transport error: {0}")]
    Transport(String),
}
