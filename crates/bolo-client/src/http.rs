//! `ChatService` over HTTP using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use bolo_core::error::{BoloError, Result};
use bolo_core::types::{HistoryRecord, Identity, LanguageOption};

use crate::service::ChatService;
use crate::urls::{endpoint, parse_base_url};
use crate::wire::{
    ChatRequest, ChatResponseBody, ErrorBody, HealthStatus, HistoryResponse, LanguagesResponse,
    LoginRequest, LoginResponse, SttRequest, SttResponse, TtsRequest, TtsResponse,
};

/// HTTP client for the answering service.
#[derive(Debug, Clone)]
pub struct HttpChatService {
    client: Client,
    base: Url,
}

impl HttpChatService {
    /// Create a client for `base_url`.
    ///
    /// A `timeout` of `None` leaves requests unbounded, so a hung call only
    /// stalls the turn that issued it.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BoloError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base })
    }

    /// The base address requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = endpoint(&self.base, segments)?;
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await.map_err(network_error)?;
        decode(response).await
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = endpoint(&self.base, segments)?;
        tracing::debug!(url = %url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        decode(response).await
    }
}

fn network_error(err: reqwest::Error) -> BoloError {
    if err.is_decode() {
        BoloError::InvalidResponse(err.to_string())
    } else {
        BoloError::Network(err.to_string())
    }
}

/// Turn a response into `T`, mapping non-success statuses to `BoloError::Http`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        return Err(BoloError::Http {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await.map_err(network_error)?;
    serde_json::from_slice(&bytes).map_err(|e| BoloError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn login(&self, user_id: &str) -> Result<Identity> {
        let response: LoginResponse = self
            .post_json(&["login"], &LoginRequest { user_id })
            .await?;
        Identity::new(response.user_id, response.session_id)
    }

    async fn user_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>> {
        let response: HistoryResponse = self.get_json(&["user_history", user_id]).await?;
        Ok(response.histories)
    }

    async fn languages(&self) -> Result<Vec<LanguageOption>> {
        let response: LanguagesResponse = self.get_json(&["languages"]).await?;
        Ok(response.languages)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let response: ChatResponseBody = self.post_json(&["chat"], request).await?;
        match response.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(BoloError::InvalidResponse(
                "chat response was empty".to_string(),
            )),
        }
    }

    async fn synthesize(&self, request: &TtsRequest) -> Result<Option<String>> {
        let response: TtsResponse = self.post_json(&["tts"], request).await?;
        if let Some(err) = response.error.as_deref().or(response.message.as_deref()) {
            tracing::debug!(reason = %err, "Synthesis returned no audio");
        }
        Ok(response.audio_url.filter(|u| !u.trim().is_empty()))
    }

    async fn transcribe(&self, audio_base64: &str, language: &str) -> Result<String> {
        let body = SttRequest {
            audio_data: audio_base64.to_string(),
            language: language.to_string(),
        };
        let response: SttResponse = self.post_json(&["stt"], &body).await?;
        Ok(response.text)
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.get_json(&["health"]).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base() {
        let err = HttpChatService::new("::not-a-url::", None).unwrap_err();
        assert!(matches!(err, BoloError::Config(_)));
    }

    #[test]
    fn test_new_accepts_timeout() {
        let svc = HttpChatService::new("http://localhost:8000", Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(svc.base_url().as_str(), "http://localhost:8000/");
    }
}
