//! Request and response payloads of the service endpoints.

use serde::{Deserialize, Serialize};

use bolo_core::types::{HistoryRecord, LanguageOption};

/// `POST /login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub user_id: &'a str,
}

/// `POST /login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub session_id: String,
}

/// `GET /user_history/{user_id}` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub histories: Vec<HistoryRecord>,
}

/// `GET /languages` response.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageOption>,
}

/// `POST /chat` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
    /// Omitted when no one is logged in; the service then opens a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// `POST /chat` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /tts` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub language: String,
}

/// `POST /tts` response. `audio_url` is null when synthesis is unavailable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TtsResponse {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /stt` body: base64 16-bit mono PCM at 16 kHz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SttRequest {
    pub audio_data: String,
    pub language: String,
}

/// `POST /stt` response.
#[derive(Debug, Clone, Deserialize)]
pub struct SttResponse {
    #[serde(default)]
    pub text: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub census_enabled: bool,
    #[serde(default)]
    pub translation_enabled: bool,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Error body shape used by the service for non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
