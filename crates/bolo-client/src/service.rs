//! The service seam shared by the session, speech and chat crates.

use async_trait::async_trait;

use bolo_core::error::Result;
use bolo_core::types::{HistoryRecord, Identity, LanguageOption};

use crate::wire::{ChatRequest, HealthStatus, TtsRequest};

/// Operations offered by the remote answering service.
///
/// Every method is a single request/response round trip. Implementations
/// never retry; callers decide how a failure degrades.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Create or resume a session for `user_id`.
    async fn login(&self, user_id: &str) -> Result<Identity>;

    /// All past sessions of `user_id`, newest first as the service orders them.
    async fn user_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>>;

    /// Languages the service can answer in.
    async fn languages(&self) -> Result<Vec<LanguageOption>>;

    /// Ask a question and return the non-empty answer text.
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Synthesize `request.text`; returns the audio path, if any was produced.
    async fn synthesize(&self, request: &TtsRequest) -> Result<Option<String>>;

    /// Recognize base64-encoded PCM audio.
    async fn transcribe(&self, audio_base64: &str, language: &str) -> Result<String>;

    async fn health(&self) -> Result<HealthStatus>;
}
