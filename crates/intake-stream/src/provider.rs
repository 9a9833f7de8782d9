use std::fmt;
use std::pin::Pin;

use crate::application::VisaApplication;
use crate::errors::ProviderError;
use crate::event::UpstreamEvent;
use crate::prompt;

/// Stable identifier for a provider implementation (for example `openai`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    /// Creates a provider id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the provider id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One extraction request against the upstream provider.
///
/// Both the streaming and the one-shot path carry the same schema constraint;
/// only the system instruction differs.
#[derive(Clone, Debug)]
pub struct ExtractRequest {
    /// Free-text message supplied by the applicant.
    pub user_message: String,
    /// System instruction for this path.
    pub system_prompt: String,
    /// JSON-schema generation constraint.
    pub schema: serde_json::Value,
}

impl ExtractRequest {
    /// Builds a request for the one-shot extraction path.
    pub fn one_shot(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            system_prompt: prompt::ONESHOT_INSTRUCTION.to_string(),
            schema: VisaApplication::json_schema(),
        }
    }

    /// Builds a request for the streaming path (shorter instruction).
    pub fn streaming(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            system_prompt: prompt::STREAM_INSTRUCTION.to_string(),
            schema: VisaApplication::json_schema(),
        }
    }
}

/// Synthesized speech returned by the text-to-speech collaborator.
#[derive(Clone, Debug)]
pub struct SpeechAudio {
    /// Encoded audio bytes.
    pub bytes: bytes::Bytes,
    /// Provider format tag (for example `mp3`).
    pub format: String,
}

impl SpeechAudio {
    /// HTTP content type implied by the format tag.
    pub fn content_type(&self) -> &'static str {
        match self.format.as_str() {
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "opus" => "audio/ogg",
            "aac" => "audio/aac",
            "flac" => "audio/flac",
            _ => "application/octet-stream",
        }
    }
}

/// Boxed stream of upstream events terminated by exhaustion or one error.
pub type UpstreamEventStream =
    Pin<Box<dyn futures::Stream<Item = Result<UpstreamEvent, ProviderError>> + Send + 'static>>;

/// Handle for one live upstream streaming session.
pub struct UpstreamStreamHandle {
    /// The event stream; exactly one subscription per relay session.
    pub stream: UpstreamEventStream,
}

/// Contract implemented by upstream language-model providers.
#[async_trait::async_trait]
pub trait IntakeProvider: Send + Sync {
    /// Identifier used in logs and error labels.
    fn id(&self) -> ProviderId;

    /// One-shot schema-constrained call; returns the opaque response value.
    async fn extract_once(&self, req: ExtractRequest) -> Result<serde_json::Value, ProviderError>;

    /// Opens a streaming session for the request.
    async fn start_stream(&self, req: ExtractRequest) -> Result<UpstreamStreamHandle, ProviderError>;

    /// Converts question text to audio.
    async fn synthesize_speech(&self, text: &str) -> Result<SpeechAudio, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_paths_share_schema_but_not_instruction() {
        let one_shot = ExtractRequest::one_shot("msg");
        let streaming = ExtractRequest::streaming("msg");
        assert_eq!(one_shot.schema, streaming.schema);
        assert_ne!(one_shot.system_prompt, streaming.system_prompt);
    }

    #[test]
    fn speech_audio_maps_known_formats() {
        let audio = SpeechAudio {
            bytes: bytes::Bytes::new(),
            format: "mp3".into(),
        };
        assert_eq!(audio.content_type(), "audio/mpeg");
        let unknown = SpeechAudio {
            bytes: bytes::Bytes::new(),
            format: "midi".into(),
        };
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }
}
