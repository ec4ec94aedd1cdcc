//! Recognizer backed by the service's `/stt` endpoint.
//!
//! Audio comes from a 16-bit PCM WAV file. It is split into fixed windows,
//! each window is base64-encoded and recognized remotely, and every
//! non-empty result is emitted as a final transcript segment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::sync::mpsc;

use bolo_client::ChatService;

use crate::error::SpeechError;
use crate::recognizer::{RecognitionStream, SpeechRecognizer, TranscriptEvent, EVENT_CHANNEL_SIZE};

/// Sample rate the recognition endpoint expects.
pub const EXPECTED_SAMPLE_RATE: u32 = 16_000;

/// Decoded mono audio ready for chunking.
#[derive(Debug, Clone)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl PcmAudio {
    /// Split into windows of `chunk_ms` milliseconds (the last may be shorter).
    pub fn chunks(&self, chunk_ms: u32) -> Vec<&[i16]> {
        let per_chunk = ((self.sample_rate as u64 * chunk_ms as u64) / 1000).max(1) as usize;
        self.samples.chunks(per_chunk).collect()
    }
}

/// Read a WAV file as mono 16-bit PCM, averaging channels.
pub fn read_wav(path: &Path) -> Result<PcmAudio, SpeechError> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| SpeechError::Input(format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SpeechError::Input(format!(
            "{}: expected 16-bit integer PCM, got {} bits {:?}",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let interleaved: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .map_err(|e| SpeechError::Input(format!("{}: {}", path.display(), e)))?;

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|s| *s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    };

    Ok(PcmAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Little-endian PCM bytes of `samples`, base64-encoded.
pub fn encode_chunk(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

/// Continuous recognition over the remote `/stt` endpoint.
pub struct RemoteRecognizer {
    service: Arc<dyn ChatService>,
    input: PathBuf,
    chunk_ms: u32,
}

impl RemoteRecognizer {
    pub fn new(service: Arc<dyn ChatService>, input: impl Into<PathBuf>, chunk_ms: u32) -> Self {
        Self {
            service,
            input: input.into(),
            chunk_ms: chunk_ms.max(100),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for RemoteRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn open(&self, language: &str) -> Result<RecognitionStream, SpeechError> {
        let path = self.input.clone();
        let audio = tokio::task::spawn_blocking(move || read_wav(&path))
            .await
            .map_err(|e| SpeechError::Input(format!("audio reader task failed: {}", e)))??;

        if audio.sample_rate != EXPECTED_SAMPLE_RATE {
            tracing::warn!(
                sample_rate = audio.sample_rate,
                expected = EXPECTED_SAMPLE_RATE,
                "Capture input sample rate differs from what the recognizer expects"
            );
        }

        let windows: Vec<String> = audio
            .chunks(self.chunk_ms)
            .into_iter()
            .map(encode_chunk)
            .collect();
        tracing::info!(
            input = %self.input.display(),
            windows = windows.len(),
            language = %language,
            "Remote recognition started"
        );

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let service = Arc::clone(&self.service);
        let language = language.to_string();
        tokio::spawn(async move {
            for window in windows {
                let result = tokio::select! {
                    _ = tx.closed() => return,
                    result = service.transcribe(&window, &language) => result,
                };
                match result {
                    Ok(text) if !text.trim().is_empty() => {
                        if tx.send(TranscriptEvent::Final(text)).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) => tracing::debug!("Recognition window produced no text"),
                    Err(e) => tracing::warn!(error = %e, "Recognition window failed"),
                }
            }
            tracing::debug!("Remote recognition input exhausted");
        });
        Ok(rx)
    }
}

// =============================================================================
// Tests
// =============================================================================
