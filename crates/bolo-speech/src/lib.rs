//! Speech capture: a continuous recognition stream feeding a live transcript.
//!
//! The capture controller toggles between `Idle` and `Listening`. While
//! listening, recognition events from a `SpeechRecognizer` update a shared
//! transcript that observers follow through a `watch` channel.

pub mod controller;
pub mod error;
pub mod recognizer;
pub mod remote;
pub mod state;

pub use controller::{CaptureController, CaptureSession};
pub use error::SpeechError;
pub use recognizer::{
    MockRecognizer, RecognitionStream, SpeechRecognizer, TranscriptEvent, UnsupportedRecognizer,
};
pub use remote::RemoteRecognizer;
pub use state::CaptureState;
