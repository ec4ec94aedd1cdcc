use thiserror::Error;

/// Top-level error type for the Bolo client.
///
/// Subsystem crates with their own failure vocabulary define local error
/// types and convert to and from `BoloError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BoloError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Service returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl From<toml::de::Error> for BoloError {
    fn from(err: toml::de::Error) -> Self {
        BoloError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BoloError {
    fn from(err: toml::ser::Error) -> Self {
        BoloError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BoloError {
    fn from(err: serde_json::Error) -> Self {
        BoloError::Serialization(err.to_string())
    }
}

impl BoloError {
    /// Whether this error came from talking to the remote service.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            BoloError::Http { .. } | BoloError::Network(_) | BoloError::InvalidResponse(_)
        )
    }
}

/// A specialized `Result` type for Bolo operations.
pub type Result<T> = std::result::Result<T, BoloError>;
