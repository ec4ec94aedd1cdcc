//! Single-clip playback controller.
//!
//! At most one clip is audible: `play` stops the active clip before the
//! next one starts. Failures are logged and reported as a
//! `PlaybackOutcome`; they never propagate as errors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use bolo_core::config::PlaybackConfig;

use crate::player::{AudioPlayer, CommandPlayer, NullPlayer, PlaybackHandle};

/// Result of a `play` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started,
    Failed(String),
}

impl PlaybackOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlaybackOutcome::Started)
    }
}

pub struct PlaybackController {
    player: Arc<dyn AudioPlayer>,
    // Held across `start` so concurrent plays cannot both become active.
    active: Mutex<Option<Box<dyn PlaybackHandle>>>,
    plays_started: AtomicUsize,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("plays_started", &self.plays_started())
            .finish()
    }
}

impl PlaybackController {
    pub fn new(player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            player,
            active: Mutex::new(None),
            plays_started: AtomicUsize::new(0),
        }
    }

    /// Build the player described by `[playback]`.
    pub fn from_config(config: &PlaybackConfig) -> Self {
        if !config.enabled {
            tracing::info!("Audio playback disabled");
            return Self::new(Arc::new(NullPlayer));
        }
        Self::new(Arc::new(CommandPlayer::new(
            config.player.clone(),
            config.player_args.clone(),
        )))
    }

    /// Interrupt any active clip, then start `url`.
    pub async fn play(&self, url: &str) -> PlaybackOutcome {
        let mut active = self.active.lock().await;
        if let Some(mut previous) = active.take() {
            if !previous.finished() {
                tracing::debug!("Interrupting active clip");
            }
            previous.stop();
        }

        match self.player.start(url).await {
            Ok(handle) => {
                *active = Some(handle);
                self.plays_started.fetch_add(1, Ordering::SeqCst);
                tracing::info!(url = %url, "Playback started");
                PlaybackOutcome::Started
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Playback failed");
                PlaybackOutcome::Failed(e.to_string())
            }
        }
    }

    /// Stop the active clip, if any.
    pub async fn stop(&self) {
        if let Some(mut handle) = self.active.lock().await.take() {
            handle.stop();
            tracing::debug!("Playback stopped");
        }
    }

    /// Whether a clip is still playing.
    pub async fn is_active(&self) -> bool {
        let mut active = self.active.lock().await;
        match active.as_mut() {
            Some(handle) => !handle.finished(),
            None => false,
        }
    }

    /// Number of clips successfully started.
    pub fn plays_started(&self) -> usize {
        self.plays_started.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================
