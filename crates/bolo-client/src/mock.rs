//! Scriptable in-memory `ChatService` for tests and offline use.
//!
//! Each endpoint can be told to succeed with fixed data or to fail with a
//! network error. Every request is recorded so tests can assert which calls
//! were made and in what order.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use bolo_core::error::{BoloError, Result};
use bolo_core::types::{HistoryRecord, Identity, LanguageOption};

use crate::service::ChatService;
use crate::wire::{ChatRequest, HealthStatus, TtsRequest};

#[derive(Debug)]
struct Script {
    session_id: Option<String>,
    histories: Option<Vec<HistoryRecord>>,
    languages: Option<Vec<LanguageOption>>,
    answers: HashMap<String, String>,
    answer_delays: HashMap<String, Duration>,
    chat_fails: bool,
    empty_answers: bool,
    audio_url: Option<String>,
    tts_fails: bool,
    transcripts: VecDeque<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            session_id: Some("session-1".to_string()),
            histories: Some(Vec::new()),
            languages: Some(bolo_core::language::fallback_languages()),
            answers: HashMap::new(),
            answer_delays: HashMap::new(),
            chat_fails: false,
            empty_answers: false,
            audio_url: Some("/static/tts_mock.mp3".to_string()),
            tts_fails: false,
            transcripts: VecDeque::new(),
        }
    }
}

/// A single recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Login(String),
    UserHistory(String),
    Languages,
    Chat(ChatRequest),
    Synthesize(TtsRequest),
    Transcribe(String),
    Health,
}

/// Mock answering service.
#[derive(Debug, Default)]
pub struct MockChatService {
    script: Mutex<Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn unavailable(endpoint: &str) -> BoloError {
    BoloError::Network(format!("mock {} unavailable", endpoint))
}

impl MockChatService {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut Script)) -> Self {
        if let Ok(mut script) = self.script.lock() {
            f(&mut script);
        }
        self
    }

    /// Login succeeds with this session id.
    pub fn with_session(self, session_id: &str) -> Self {
        let session_id = session_id.to_string();
        self.edit(|s| s.session_id = Some(session_id))
    }

    pub fn failing_login(self) -> Self {
        self.edit(|s| s.session_id = None)
    }

    pub fn with_histories(self, histories: Vec<HistoryRecord>) -> Self {
        self.edit(|s| s.histories = Some(histories))
    }

    pub fn failing_history(self) -> Self {
        self.edit(|s| s.histories = None)
    }

    pub fn with_languages(self, languages: Vec<LanguageOption>) -> Self {
        self.edit(|s| s.languages = Some(languages))
    }

    pub fn failing_languages(self) -> Self {
        self.edit(|s| s.languages = None)
    }

    /// Answer `message` with `answer`. Unscripted messages are echoed back
    /// as `I heard: <message>`.
    pub fn with_answer(self, message: &str, answer: &str) -> Self {
        let (message, answer) = (message.to_string(), answer.to_string());
        self.edit(|s| {
            s.answers.insert(message, answer);
        })
    }

    /// Hold the answer to `message` for `delay` before replying.
    pub fn with_answer_delay(self, message: &str, delay: Duration) -> Self {
        let message = message.to_string();
        self.edit(|s| {
            s.answer_delays.insert(message, delay);
        })
    }

    pub fn failing_chat(self) -> Self {
        self.edit(|s| s.chat_fails = true)
    }

    /// Reply to every chat with an empty response body.
    pub fn with_empty_answers(self) -> Self {
        self.edit(|s| s.empty_answers = true)
    }

    pub fn with_audio_url(self, audio_url: &str) -> Self {
        let audio_url = audio_url.to_string();
        self.edit(|s| s.audio_url = Some(audio_url))
    }

    /// Synthesis succeeds but produces no audio reference.
    pub fn without_audio(self) -> Self {
        self.edit(|s| s.audio_url = None)
    }

    pub fn failing_tts(self) -> Self {
        self.edit(|s| s.tts_fails = true)
    }

    /// Queue recognition results returned by successive `transcribe` calls.
    pub fn with_transcripts(self, transcripts: &[&str]) -> Self {
        let queued: VecDeque<String> = transcripts.iter().map(|t| t.to_string()).collect();
        self.edit(|s| s.transcripts = queued)
    }

    /// Switch chat failure on or off after construction.
    pub fn set_chat_fails(&self, fails: bool) {
        if let Ok(mut script) = self.script.lock() {
            script.chat_fails = fails;
        }
    }

    /// Issue `session_id` on later logins.
    pub fn set_session(&self, session_id: &str) {
        if let Ok(mut script) = self.script.lock() {
            script.session_id = Some(session_id.to_string());
        }
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Chat(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn tts_requests(&self) -> Vec<TtsRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Synthesize(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn read<T>(&self, f: impl FnOnce(&mut Script) -> T) -> Result<T> {
        let mut script = self
            .script
            .lock()
            .map_err(|e| BoloError::Storage(format!("mock script lock poisoned: {}", e)))?;
        Ok(f(&mut script))
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn login(&self, user_id: &str) -> Result<Identity> {
        self.record(RecordedCall::Login(user_id.to_string()));
        let session_id = self.read(|s| s.session_id.clone())?;
        match session_id {
            Some(session_id) => Identity::new(user_id, session_id),
            None => Err(unavailable("login")),
        }
    }

    async fn user_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>> {
        self.record(RecordedCall::UserHistory(user_id.to_string()));
        self.read(|s| s.histories.clone())?
            .ok_or_else(|| unavailable("user_history"))
    }

    async fn languages(&self) -> Result<Vec<LanguageOption>> {
        self.record(RecordedCall::Languages);
        self.read(|s| s.languages.clone())?
            .ok_or_else(|| unavailable("languages"))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        self.record(RecordedCall::Chat(request.clone()));
        let (fails, empty, answer, delay) = self.read(|s| {
            (
                s.chat_fails,
                s.empty_answers,
                s.answers.get(&request.message).cloned(),
                s.answer_delays.get(&request.message).copied(),
            )
        })?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(unavailable("chat"));
        }
        if empty {
            return Err(BoloError::InvalidResponse(
                "chat response was empty".to_string(),
            ));
        }
        Ok(answer.unwrap_or_else(|| format!("I heard: {}", request.message)))
    }

    async fn synthesize(&self, request: &TtsRequest) -> Result<Option<String>> {
        self.record(RecordedCall::Synthesize(request.clone()));
        let (fails, audio_url) = self.read(|s| (s.tts_fails, s.audio_url.clone()))?;
        if fails {
            return Err(unavailable("tts"));
        }
        Ok(audio_url)
    }

    async fn transcribe(&self, audio_base64: &str, _language: &str) -> Result<String> {
        self.record(RecordedCall::Transcribe(audio_base64.to_string()));
        Ok(self.read(|s| s.transcripts.pop_front())?.unwrap_or_default())
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.record(RecordedCall::Health);
        Ok(HealthStatus {
            status: "ok".to_string(),
            time: None,
            census_enabled: false,
            translation_enabled: false,
        })
    }
}
