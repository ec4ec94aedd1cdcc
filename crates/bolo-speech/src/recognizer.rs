//! Recognition stream seam and the non-network recognizers.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SpeechError;

/// Channel capacity between a recognizer and the capture controller.
pub const EVENT_CHANNEL_SIZE: usize = 32;

/// A transcript update from a running recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Provisional text for the segment being spoken; replaced by the next event.
    Interim(String),
    /// Settled text for a segment.
    Final(String),
}

/// Receiving end of a continuous recognition session.
///
/// Dropping it stops the recognizer: producers watch for the channel to
/// close and end their session.
pub type RecognitionStream = mpsc::Receiver<TranscriptEvent>;

/// A continuous speech-to-text engine keyed by language.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the platform can capture speech at all.
    fn is_supported(&self) -> bool;

    /// Begin continuous recognition in `language`.
    async fn open(&self, language: &str) -> Result<RecognitionStream, SpeechError>;
}

/// Recognizer for platforms without speech capture.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedRecognizer;

#[async_trait]
impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn open(&self, _language: &str) -> Result<RecognitionStream, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

/// Recognizer that replays a fixed script of events.
///
/// Each `open` replays the whole script, pausing `interval` between events.
/// The languages requested are recorded for assertions.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    script: Vec<TranscriptEvent>,
    interval: Duration,
    keep_open: bool,
    languages: std::sync::Mutex<Vec<String>>,
}

impl MockRecognizer {
    pub fn new(script: Vec<TranscriptEvent>) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Keep the stream open after the script ends, like a live microphone.
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    /// Languages passed to `open`, in call order.
    pub fn opened_languages(&self) -> Vec<String> {
        self.languages.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn open(&self, language: &str) -> Result<RecognitionStream, SpeechError> {
        if let Ok(mut languages) = self.languages.lock() {
            languages.push(language.to_string());
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let script = self.script.clone();
        let interval = self.interval;
        let keep_open = self.keep_open;
        tokio::spawn(async move {
            for event in script {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            if keep_open {
                tx.closed().await;
            }
        });
        Ok(rx)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_recognizer() {
        let recognizer = UnsupportedRecognizer;
        assert!(!recognizer.is_supported());
        assert!(matches!(
            recognizer.open("en").await,
            Err(SpeechError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_mock_replays_script_then_closes() {
        let recognizer = MockRecognizer::new(vec![
            TranscriptEvent::Interim("popu".into()),
            TranscriptEvent::Final("population".into()),
        ]);
        let mut stream = recognizer.open("hi").await.unwrap();
        assert_eq!(
            stream.recv().await,
            Some(TranscriptEvent::Interim("popu".into()))
        );
        assert_eq!(
            stream.recv().await,
            Some(TranscriptEvent::Final("population".into()))
        );
        assert_eq!(stream.recv().await, None);
        assert_eq!(recognizer.opened_languages(), vec!["hi"]);
    }
}
