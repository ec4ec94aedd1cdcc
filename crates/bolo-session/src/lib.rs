//! Identity persistence and per-user history.
//!
//! The session store keeps the logged-in `user_id` and server-issued
//! `session_id` in client-local storage so they survive restarts. The
//! history cache holds the past sessions fetched right after login.

pub mod history;
pub mod kv;
pub mod session;

pub use history::HistoryCache;
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use session::{SessionStore, SESSION_ID_KEY, USER_ID_KEY};
