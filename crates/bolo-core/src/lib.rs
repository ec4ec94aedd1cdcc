pub mod config;
pub mod error;
pub mod language;
pub mod types;

pub use config::BoloConfig;
pub use error::{BoloError, Result};
pub use language::{fallback_languages, resolve_language_code, LanguageCatalog, DEFAULT_LANGUAGE};
pub use types::*;
