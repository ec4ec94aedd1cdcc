//! Conversation orchestrator: owns the session state and drives each turn.
//!
//! A turn moves through `Idle -> AwaitingAnswer -> AwaitingSpeech -> Idle`.
//! The user turn is appended before any network call. The answer request
//! always yields a bot turn (the fallback message on failure); synthesis and
//! playback are best-effort.
//!
//! Every turn is stamped with the conversation epoch it started in. Logout
//! and session-changing logins start a new epoch; a turn that completes in a
//! later epoch is dropped instead of landing in the new conversation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use bolo_audio::{NullPlayer, PlaybackController, PlaybackOutcome};
use bolo_client::{resolve_audio_url, ChatRequest, ChatService, TtsRequest};
use bolo_core::config::ChatConfig;
use bolo_core::types::{Identity, Turn};
use bolo_session::{HistoryCache, KeyValueStore, SessionStore};
use bolo_speech::{CaptureController, CaptureState, UnsupportedRecognizer};

use crate::error::ChatError;
use crate::language::LanguageSelector;
use crate::log::MessageLog;

/// Where the current turn cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitingAnswer,
    AwaitingSpeech,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "Idle"),
            TurnPhase::AwaitingAnswer => write!(f, "AwaitingAnswer"),
            TurnPhase::AwaitingSpeech => write!(f, "AwaitingSpeech"),
        }
    }
}

/// Turns in flight per phase. The reported phase is the furthest-behind one.
#[derive(Debug, Default)]
struct InFlight {
    answering: usize,
    speaking: usize,
}

impl InFlight {
    fn phase(&self) -> TurnPhase {
        if self.answering > 0 {
            TurnPhase::AwaitingAnswer
        } else if self.speaking > 0 {
            TurnPhase::AwaitingSpeech
        } else {
            TurnPhase::Idle
        }
    }

    fn slot(&mut self, phase: TurnPhase) -> Option<&mut usize> {
        match phase {
            TurnPhase::AwaitingAnswer => Some(&mut self.answering),
            TurnPhase::AwaitingSpeech => Some(&mut self.speaking),
            TurnPhase::Idle => None,
        }
    }
}

/// Counts one turn in `phase` until dropped, including when the turn's
/// future is cancelled.
struct PhaseGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    phase: TurnPhase,
}

impl<'a> PhaseGuard<'a> {
    fn enter(in_flight: &'a Mutex<InFlight>, phase: TurnPhase) -> Self {
        shift(in_flight, phase, true);
        Self { in_flight, phase }
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        shift(self.in_flight, self.phase, false);
    }
}

fn shift(in_flight: &Mutex<InFlight>, phase: TurnPhase, enter: bool) {
    let mut counts = match in_flight.lock() {
        Ok(counts) => counts,
        Err(poisoned) => poisoned.into_inner(),
    };
    let before = counts.phase();
    if let Some(slot) = counts.slot(phase) {
        *slot = if enter { *slot + 1 } else { slot.saturating_sub(1) };
    }
    let after = counts.phase();
    if before != after {
        tracing::debug!("Turn phase: {} -> {}", before, after);
    }
}

/// Report of one `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// `None` when the input was blank and nothing was sent.
    pub user_turn: Option<Turn>,
    /// `None` when the conversation was reset before the answer arrived.
    pub bot_turn: Option<Turn>,
    /// Whether the service answered; `false` means the fallback was used.
    pub answered: bool,
    /// `None` when synthesis was skipped, failed, or returned no audio.
    pub playback: Option<PlaybackOutcome>,
}

impl TurnOutcome {
    fn skipped() -> Self {
        Self {
            user_turn: None,
            bot_turn: None,
            answered: false,
            playback: None,
        }
    }

    fn stale(user_turn: Turn) -> Self {
        Self {
            user_turn: Some(user_turn),
            ..Self::skipped()
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.user_turn.is_none()
    }
}

/// Owned state of one client: identity, log, pending input, language,
/// capture and playback.
pub struct ConversationOrchestrator<S: KeyValueStore> {
    service: Arc<dyn ChatService>,
    base_url: String,
    session: SessionStore<S>,
    history: HistoryCache,
    log: MessageLog,
    languages: LanguageSelector,
    capture: CaptureController,
    playback: PlaybackController,
    pending: Arc<watch::Sender<String>>,
    in_flight: Mutex<InFlight>,
    epoch: AtomicU64,
    turn_gate: tokio::sync::Mutex<()>,
    config: ChatConfig,
}

impl<S: KeyValueStore> ConversationOrchestrator<S> {
    /// Build an orchestrator with capture unsupported, playback silent, and
    /// the built-in language list. Use the `with_*` methods to plug in real
    /// components.
    pub fn new(
        service: Arc<dyn ChatService>,
        base_url: impl Into<String>,
        session: SessionStore<S>,
        config: ChatConfig,
    ) -> Self {
        let (pending, _) = watch::channel(String::new());
        Self {
            service,
            base_url: base_url.into(),
            session,
            history: HistoryCache::new(),
            log: MessageLog::new(),
            languages: LanguageSelector::default(),
            capture: CaptureController::new(Arc::new(UnsupportedRecognizer)),
            playback: PlaybackController::new(Arc::new(NullPlayer)),
            pending: Arc::new(pending),
            in_flight: Mutex::new(InFlight::default()),
            epoch: AtomicU64::new(0),
            turn_gate: tokio::sync::Mutex::new(()),
            config,
        }
    }

    pub fn with_capture(mut self, capture: CaptureController) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_playback(mut self, playback: PlaybackController) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_languages(mut self, languages: LanguageSelector) -> Self {
        self.languages = languages;
        self
    }

    pub fn service(&self) -> &dyn ChatService {
        self.service.as_ref()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    pub fn languages(&self) -> &LanguageSelector {
        &self.languages
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.current()
    }

    /// `AwaitingAnswer` while any turn waits on its answer, `AwaitingSpeech`
    /// while any turn is only synthesizing or starting playback, else `Idle`.
    pub fn phase(&self) -> TurnPhase {
        match self.in_flight.lock() {
            Ok(counts) => counts.phase(),
            Err(poisoned) => poisoned.into_inner().phase(),
        }
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Empty the log and orphan every turn still in flight.
    fn reset_conversation(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.log.clear();
    }

    // -- session --------------------------------------------------------

    /// Restore a persisted identity and, if there is one, its history.
    pub async fn restore(&self) -> Result<Option<Identity>, ChatError> {
        let identity = self.session.restore()?;
        if let Some(identity) = &identity {
            self.history.load(self.service.as_ref(), &identity.user_id).await;
        }
        Ok(identity)
    }

    /// Log in, then fetch the user's history.
    ///
    /// A failed login leaves the client logged out (or as it was) and is
    /// reported to the caller; a failed history fetch only empties history.
    pub async fn login(&self, user_id: &str) -> Result<Identity, ChatError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ChatError::EmptyUserId);
        }

        let previous = self.session.current();
        let identity = self
            .session
            .login(self.service.as_ref(), user_id)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Login failed");
                ChatError::LoginFailed(e.to_string())
            })?;

        if previous.as_ref().map(|p| &p.session_id) != Some(&identity.session_id) {
            self.reset_conversation();
        }
        self.history
            .load(self.service.as_ref(), &identity.user_id)
            .await;
        Ok(identity)
    }

    /// Forget the identity and everything tied to the session.
    ///
    /// Local conversation state is cleared even when removing the persisted
    /// identity fails; that storage error is returned afterwards.
    pub async fn logout(&self) -> Result<(), ChatError> {
        self.reset_conversation();
        self.history.clear();
        if self.capture.is_listening() {
            if let Err(e) = self.capture.stop() {
                tracing::debug!(error = %e, "Capture already stopped");
            }
        }
        self.capture.reset_transcript();
        self.set_pending("");
        self.playback.stop().await;
        self.session.logout()?;
        Ok(())
    }

    /// Fetch the language catalog, falling back to the built-in list.
    pub async fn load_languages(&self) -> usize {
        self.languages.load(self.service.as_ref()).await
    }

    /// Switch the language used by the next message and the next capture.
    pub fn select_language(&self, code: &str) -> Result<(), ChatError> {
        self.languages.select(code)
    }

    // -- input ----------------------------------------------------------

    pub fn pending(&self) -> String {
        self.pending.borrow().clone()
    }

    pub fn set_pending(&self, text: &str) {
        self.pending.send_replace(text.to_string());
    }

    pub fn subscribe_pending(&self) -> watch::Receiver<String> {
        self.pending.subscribe()
    }

    /// Mirror every transcript update into the pending input.
    ///
    /// Runs until the capture controller is dropped or the handle is aborted.
    pub fn spawn_transcript_sync(&self) -> JoinHandle<()> {
        let mut transcript = self.capture.subscribe();
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            while transcript.changed().await.is_ok() {
                let text = transcript.borrow_and_update().clone();
                pending.send_replace(text);
            }
        })
    }

    /// Start or stop capture in the active language.
    pub async fn toggle_listening(&self) -> Result<CaptureState, ChatError> {
        let language = self.languages.active();
        Ok(self.capture.toggle(&language).await?)
    }

    // -- turns ----------------------------------------------------------

    /// Send whatever is in the pending input.
    pub async fn send_pending(&self) -> TurnOutcome {
        let text = self.pending();
        self.send_message(&text).await
    }

    /// Run one turn for `text`.
    ///
    /// Blank input is ignored. Otherwise the user turn is appended at once,
    /// then exactly one bot turn follows, unless logout or a new session
    /// clears the conversation first. With `serialize_turns` the round trips
    /// of concurrent calls run one at a time in call order.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring empty message");
            return TurnOutcome::skipped();
        }

        let epoch = self.current_epoch();
        let user_turn = Turn::user(text);
        self.log.push(user_turn.clone());

        let request = ChatRequest {
            message: text.to_string(),
            language: self.languages.active(),
            session_id: self.session.current().map(|i| i.session_id),
        };

        let answering = PhaseGuard::enter(&self.in_flight, TurnPhase::AwaitingAnswer);
        let _gate = if self.config.serialize_turns {
            Some(self.turn_gate.lock().await)
        } else {
            None
        };
        if self.current_epoch() != epoch {
            tracing::debug!("Conversation reset while queued, dropping turn");
            return TurnOutcome::stale(user_turn);
        }
        let (bot_turn, answered) = match self.service.chat(&request).await {
            Ok(answer) => (Turn::bot(answer), true),
            Err(e) => {
                tracing::warn!(
                    language = %request.language,
                    error = %e,
                    "Answer request failed, using fallback message"
                );
                (Turn::bot(self.config.fallback_message.clone()), false)
            }
        };
        if self.current_epoch() != epoch {
            tracing::debug!(answered, "Conversation reset during the turn, dropping answer");
            return TurnOutcome::stale(user_turn);
        }
        self.log.push(bot_turn.clone());

        let playback = if answered {
            let _speaking = PhaseGuard::enter(&self.in_flight, TurnPhase::AwaitingSpeech);
            drop(answering);
            self.speak(&bot_turn.text, &request.language, epoch).await
        } else {
            drop(answering);
            None
        };

        if self.current_epoch() == epoch {
            self.set_pending("");
            self.capture.reset_transcript();
        }

        TurnOutcome {
            user_turn: Some(user_turn),
            bot_turn: Some(bot_turn),
            answered,
            playback,
        }
    }

    async fn speak(&self, text: &str, language: &str, epoch: u64) -> Option<PlaybackOutcome> {
        let request = TtsRequest {
            text: text.to_string(),
            language: language.to_string(),
        };
        let audio_url = match self.service.synthesize(&request).await {
            Ok(Some(audio_url)) => audio_url,
            Ok(None) => {
                tracing::debug!("Synthesis returned no audio");
                return None;
            }
            Err(e) => {
                tracing::warn!(language = %language, error = %e, "Synthesis failed, skipping playback");
                return None;
            }
        };

        if self.current_epoch() != epoch {
            tracing::debug!("Conversation reset during synthesis, not playing");
            return None;
        }

        match resolve_audio_url(&self.base_url, &audio_url) {
            Ok(url) => Some(self.playback.play(&url).await),
            Err(e) => {
                tracing::warn!(audio_url = %audio_url, error = %e, "Unusable audio URL");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
