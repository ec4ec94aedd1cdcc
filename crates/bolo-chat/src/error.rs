//! Error types for the conversation engine.

use bolo_core::error::BoloError;
use bolo_speech::SpeechError;

/// Errors from the conversation engine.
///
/// Failed service round trips inside a turn are not errors: they degrade to
/// the fallback answer or to silence.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
    #[error("user id cannot be empty")]
    EmptyUserId,
    #[error("login failed: {0}")]
    LoginFailed(String),
    #[error("speech capture error: {0}")]
    Speech(#[from] SpeechError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<BoloError> for ChatError {
    fn from(err: BoloError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<ChatError> for BoloError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Speech(speech) => speech.into(),
            ChatError::Storage(msg) => BoloError::Storage(msg),
            ChatError::LoginFailed(msg) => BoloError::Network(msg),
            other => BoloError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::UnknownLanguage("xx".into()).to_string(),
            "unknown language: xx"
        );
        assert_eq!(ChatError::EmptyUserId.to_string(), "user id cannot be empty");
        assert_eq!(
            ChatError::Speech(SpeechError::Unsupported).to_string(),
            "speech capture error: speech recognition is not supported on this platform"
        );
    }

    #[test]
    fn test_chat_error_from_bolo_error() {
        let err: ChatError = BoloError::Storage("disk full".into()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_chat_error_into_bolo_error() {
        let err: BoloError = ChatError::Speech(SpeechError::Unsupported).into();
        assert!(matches!(err, BoloError::Unsupported(_)));

        let err: BoloError = ChatError::UnknownLanguage("xx".into()).into();
        assert!(matches!(err, BoloError::Config(_)));
    }
}
