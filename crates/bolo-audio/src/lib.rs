//! Playback of synthesized speech, one clip at a time.

pub mod controller;
pub mod player;

pub use controller::{PlaybackController, PlaybackOutcome};
pub use player::{AudioPlayer, CommandPlayer, MockPlayer, NullPlayer, PlaybackHandle};
