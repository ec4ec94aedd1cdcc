//! Audio output seam and its implementations.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::{Child, Command};

use bolo_core::error::{BoloError, Result};

/// A clip that has started playing.
pub trait PlaybackHandle: Send {
    /// Stop output and release the clip. Idempotent.
    fn stop(&mut self);

    /// Whether the clip has ended, either on its own or through `stop`.
    fn finished(&mut self) -> bool;
}

/// Something that can play an audio address.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn start(&self, url: &str) -> Result<Box<dyn PlaybackHandle>>;
}

/// Plays clips through an external program, the URL as its last argument.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn start(&self, url: &str) -> Result<Box<dyn PlaybackHandle>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BoloError::Playback(format!("failed to launch {}: {}", self.program, e)))?;
        tracing::debug!(program = %self.program, pid = ?child.id(), "Player process started");
        Ok(Box::new(ProcessHandle {
            child,
            url: url.to_string(),
            done: false,
        }))
    }
}

struct ProcessHandle {
    child: Child,
    url: String,
    done: bool,
}

impl PlaybackHandle for ProcessHandle {
    fn stop(&mut self) {
        if self.done {
            return;
        }
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Player process already gone");
        }
        self.done = true;
    }

    fn finished(&mut self) -> bool {
        if self.done {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::warn!(url = %self.url, status = %status, "Player exited with failure");
                }
                self.done = true;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Could not poll player process");
                self.done = true;
            }
        }
        self.done
    }
}

/// Player used when playback is disabled. Clips finish immediately.
#[derive(Debug, Clone, Default)]
pub struct NullPlayer;

struct SilentHandle;

impl PlaybackHandle for SilentHandle {
    fn stop(&mut self) {}

    fn finished(&mut self) -> bool {
        true
    }
}

#[async_trait]
impl AudioPlayer for NullPlayer {
    async fn start(&self, url: &str) -> Result<Box<dyn PlaybackHandle>> {
        tracing::debug!(url = %url, "Playback disabled, skipping clip");
        Ok(Box::new(SilentHandle))
    }
}

/// In-memory player that tracks how many clips are audible at once.
#[derive(Debug, Default)]
pub struct MockPlayer {
    started: Mutex<Vec<String>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    fail: AtomicBool,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `start` fails, as for an unplayable clip.
    pub fn failing() -> Self {
        let player = Self::default();
        player.set_failing(true);
        player
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// URLs successfully started, in order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Clips currently playing.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of clips ever playing together.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

struct MockHandle {
    active: Arc<AtomicUsize>,
    stopped: bool,
}

impl PlaybackHandle for MockHandle {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn finished(&mut self) -> bool {
        self.stopped
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn start(&self, url: &str) -> Result<Box<dyn PlaybackHandle>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BoloError::Playback(format!("unsupported format: {}", url)));
        }
        if let Ok(mut started) = self.started.lock() {
            started.push(url.to_string());
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(MockHandle {
            active: Arc::clone(&self.active),
            stopped: false,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_player_counts_active_clips() {
        let player = MockPlayer::new();
        let mut first = player.start("http://host/a.mp3").await.unwrap();
        let second = player.start("http://host/b.mp3").await.unwrap();
        assert_eq!(player.active(), 2);
        assert_eq!(player.max_active(), 2);

        first.stop();
        first.stop();
        assert!(first.finished());
        assert_eq!(player.active(), 1);

        drop(second);
        assert_eq!(player.active(), 0);
        assert_eq!(player.started(), vec!["http://host/a.mp3", "http://host/b.mp3"]);
    }

    #[tokio::test]
    async fn test_failing_mock_player() {
        let player = MockPlayer::failing();
        let err = player.start("http://host/a.wav").await.err().unwrap();
        assert!(matches!(err, BoloError::Playback(_)));
        assert!(player.started().is_empty());
    }

    #[tokio::test]
    async fn test_null_player_finishes_immediately() {
        let mut handle = NullPlayer.start("http://host/a.mp3").await.unwrap();
        assert!(handle.finished());
    }

    #[tokio::test]
    async fn test_command_player_missing_program() {
        let player = CommandPlayer::new("bolo-no-such-player", vec![]);
        let err = player.start("http://host/a.mp3").await.err().unwrap();
        assert!(matches!(err, BoloError::Playback(_)));
        assert!(err.to_string().contains("bolo-no-such-player"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_player_stop_kills_process() {
        // `sleep 30` stands in for a long clip.
        let player = CommandPlayer::new("sleep", vec![]);
        let mut handle = player.start("30").await.unwrap();
        assert!(!handle.finished());
        handle.stop();
        assert!(handle.finished());
    }
}
