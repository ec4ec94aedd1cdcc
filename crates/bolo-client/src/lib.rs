//! Client for the remote answering service.
//!
//! Defines the `ChatService` seam used by every other crate, the wire
//! payloads of each endpoint, an HTTP implementation on `reqwest`, and a
//! scriptable mock for tests without a network.

pub mod http;
pub mod mock;
pub mod service;
pub mod urls;
pub mod wire;

pub use http::HttpChatService;
pub use mock::MockChatService;
pub use service::ChatService;
pub use urls::resolve_audio_url;
pub use wire::{ChatRequest, HealthStatus, SttRequest, TtsRequest};
