//! Capture controller managing the listening lifecycle.
//!
//! The `CaptureController` drives a `SpeechRecognizer` through the
//! `Idle <-> Listening` state machine and folds its events into a single
//! transcript value. Observers follow the transcript through a `watch`
//! channel; the value survives `stop()` until `reset_transcript()`.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::SpeechError;
use crate::recognizer::{RecognitionStream, SpeechRecognizer, TranscriptEvent};
use crate::state::{CaptureState, StateMachine};

/// Metadata for one listening period.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    pub id: Uuid,
    pub language: String,
    pub started_at: DateTime<Utc>,
}

impl CaptureSession {
    fn new(language: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        (Utc::now() - self.started_at).num_milliseconds() as f32 / 1000.0
    }
}

#[derive(Default)]
struct Inner {
    committed: String,
    interim: String,
    pump: Option<JoinHandle<()>>,
    session: Option<CaptureSession>,
    /// Bumped on every start and stop; events from older pumps are dropped.
    generation: u64,
}

impl Inner {
    fn text(&self) -> String {
        match (self.committed.is_empty(), self.interim.is_empty()) {
            (_, true) => self.committed.clone(),
            (true, false) => self.interim.clone(),
            (false, false) => format!("{} {}", self.committed, self.interim),
        }
    }

    fn commit(&mut self, segment: &str) {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(segment);
    }
}

struct Shared {
    recognizer: Arc<dyn SpeechRecognizer>,
    state: StateMachine,
    transcript: watch::Sender<String>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn apply(&self, generation: u64, event: TranscriptEvent) {
        let text = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            match event {
                TranscriptEvent::Interim(text) => inner.interim = text.trim().to_string(),
                TranscriptEvent::Final(text) => {
                    inner.interim.clear();
                    inner.commit(&text);
                }
            }
            inner.text()
        };
        self.transcript.send_replace(text);
    }

    /// The recognizer closed its stream on its own.
    fn finish(&self, generation: u64) {
        let session = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            inner.pump = None;
            let interim = std::mem::take(&mut inner.interim);
            inner.commit(&interim);
            inner.session.take()
        };
        if self.state.current() == CaptureState::Listening {
            self.state.reset();
        }
        if let Some(session) = session {
            tracing::info!(
                capture_id = %session.id,
                elapsed_secs = session.elapsed_secs(),
                "Recognition stream ended"
            );
        }
    }
}

async fn pump(shared: Arc<Shared>, mut stream: RecognitionStream, generation: u64) {
    while let Some(event) = stream.recv().await {
        shared.apply(generation, event);
    }
    shared.finish(generation);
}

/// Speech capture wrapper exposing a live transcript and a listening flag.
///
/// Clones share the same underlying capture.
#[derive(Clone)]
pub struct CaptureController {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.shared.state.current())
            .field("transcript", &*self.shared.transcript.borrow())
            .finish()
    }
}

impl CaptureController {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        let (transcript, _) = watch::channel(String::new());
        Self {
            shared: Arc::new(Shared {
                recognizer,
                state: StateMachine::new(),
                transcript,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.shared.recognizer.is_supported()
    }

    pub fn state(&self) -> CaptureState {
        self.shared.state.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == CaptureState::Listening
    }

    /// The current listening period, if any.
    pub fn session(&self) -> Option<CaptureSession> {
        self.shared.lock().session.clone()
    }

    /// Latest transcript value.
    pub fn transcript(&self) -> String {
        self.shared.transcript.borrow().clone()
    }

    /// Follow transcript updates as they arrive.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.shared.transcript.subscribe()
    }

    /// Begin continuous recognition in `language`.
    ///
    /// Fails with `InvalidTransition` if already listening. If the recognizer
    /// cannot open a stream the controller stays `Idle`.
    pub async fn start(&self, language: &str) -> Result<(), SpeechError> {
        self.shared.state.transition(CaptureState::Listening)?;

        let stream = match self.shared.recognizer.open(language).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.state.reset();
                tracing::warn!(language = %language, error = %e, "Failed to start capture");
                return Err(e);
            }
        };

        let mut inner = self.shared.lock();
        if self.shared.state.current() != CaptureState::Listening {
            // Stopped while the stream was opening.
            return Ok(());
        }
        inner.generation += 1;
        let generation = inner.generation;
        if let Some(stale) = inner.pump.take() {
            stale.abort();
        }
        let session = CaptureSession::new(language);
        tracing::info!(capture_id = %session.id, language = %language, "Capture started");
        inner.session = Some(session);
        inner.pump = Some(tokio::spawn(pump(
            Arc::clone(&self.shared),
            stream,
            generation,
        )));
        Ok(())
    }

    /// End capture. The transcript is kept until `reset_transcript()`.
    pub fn stop(&self) -> Result<(), SpeechError> {
        self.shared.state.transition(CaptureState::Idle)?;

        let session = {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            // Aborting the pump drops the stream, which stops the recognizer.
            if let Some(pump) = inner.pump.take() {
                pump.abort();
            }
            let interim = std::mem::take(&mut inner.interim);
            inner.commit(&interim);
            inner.session.take()
        };
        if let Some(session) = session {
            tracing::info!(
                capture_id = %session.id,
                elapsed_secs = session.elapsed_secs(),
                "Capture stopped"
            );
        }
        Ok(())
    }

    /// Start when idle, stop when listening. Returns the new state.
    pub async fn toggle(&self, language: &str) -> Result<CaptureState, SpeechError> {
        match self.state() {
            CaptureState::Idle => self.start(language).await?,
            CaptureState::Listening => self.stop()?,
        }
        Ok(self.state())
    }

    /// Clear the transcript so the next capture starts clean.
    pub fn reset_transcript(&self) {
        {
            let mut inner = self.shared.lock();
            inner.committed.clear();
            inner.interim.clear();
        }
        self.shared.transcript.send_replace(String::new());
    }
}

// =============================================================================
// Tests
// =============================================================================
