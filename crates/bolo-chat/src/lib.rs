//! Conversation engine for Bolo.
//!
//! The orchestrator owns the message log and drives each user turn through
//! the answer and synthesis round trips, feeding playback and consuming the
//! speech transcript. The language selector holds the active language every
//! outgoing request uses.

pub mod error;
pub mod language;
pub mod log;
pub mod orchestrator;

pub use error::ChatError;
pub use language::LanguageSelector;
pub use log::MessageLog;
pub use orchestrator::{ConversationOrchestrator, TurnOutcome, TurnPhase};
