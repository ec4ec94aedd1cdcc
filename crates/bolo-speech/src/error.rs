use bolo_core::error::BoloError;

use crate::state::CaptureState;

/// Errors from speech capture.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("invalid capture transition: {from} -> {to}")]
    InvalidTransition { from: CaptureState, to: CaptureState },
    #[error("audio input error: {0}")]
    Input(String),
    #[error("recognizer error: {0}")]
    Recognizer(String),
}

impl From<BoloError> for SpeechError {
    fn from(err: BoloError) -> Self {
        SpeechError::Recognizer(err.to_string())
    }
}

impl From<SpeechError> for BoloError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Unsupported => BoloError::Unsupported(err.to_string()),
            other => BoloError::Speech(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_error_display() {
        assert_eq!(
            SpeechError::Unsupported.to_string(),
            "speech recognition is not supported on this platform"
        );
        let err = SpeechError::InvalidTransition {
            from: CaptureState::Idle,
            to: CaptureState::Idle,
        };
        assert_eq!(err.to_string(), "invalid capture transition: Idle -> Idle");
        assert_eq!(
            SpeechError::Input("missing file".into()).to_string(),
            "audio input error: missing file"
        );
    }

    #[test]
    fn test_conversion_into_bolo_error() {
        let err: BoloError = SpeechError::Unsupported.into();
        assert!(matches!(err, BoloError::Unsupported(_)));

        let err: BoloError = SpeechError::Recognizer("boom".into()).into();
        assert!(matches!(err, BoloError::Speech(_)));
    }

    #[test]
    fn test_conversion_from_bolo_error() {
        let err: SpeechError = BoloError::Network("refused".into()).into();
        assert!(matches!(err, SpeechError::Recognizer(_)));
        assert!(err.to_string().contains("refused"));
    }
}
