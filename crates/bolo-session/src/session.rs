//! Login lifecycle and identity persistence.

use std::sync::Mutex;

use bolo_client::ChatService;
use bolo_core::error::{BoloError, Result};
use bolo_core::types::Identity;

use crate::kv::KeyValueStore;

/// Storage key of the logged-in user.
pub const USER_ID_KEY: &str = "user_id";
/// Storage key of the current session.
pub const SESSION_ID_KEY: &str = "session_id";

/// Holds the current identity and mirrors it to persistent storage.
pub struct SessionStore<S: KeyValueStore> {
    storage: S,
    current: Mutex<Option<Identity>>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            current: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The identity currently held in memory.
    pub fn current(&self) -> Option<Identity> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    fn set_current(&self, identity: Option<Identity>) -> Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|e| BoloError::Storage(format!("identity lock poisoned: {}", e)))?;
        *current = identity;
        Ok(())
    }

    /// Read a previously persisted identity.
    ///
    /// Returns `None` unless both keys are present and non-empty; a session
    /// without a user is not an identity.
    pub fn restore(&self) -> Result<Option<Identity>> {
        let user_id = self.storage.get(USER_ID_KEY)?;
        let session_id = self.storage.get(SESSION_ID_KEY)?;
        let identity = match (user_id, session_id) {
            (Some(user_id), Some(session_id)) => Identity::new(user_id, session_id).ok(),
            _ => None,
        };
        match &identity {
            Some(id) => tracing::info!(user_id = %id.user_id, "Identity restored"),
            None => tracing::debug!("No persisted identity"),
        }
        self.set_current(identity.clone())?;
        Ok(identity)
    }

    /// Log in through the service and persist the returned identity.
    ///
    /// On failure nothing is written and any prior identity stays as it was.
    pub async fn login(&self, service: &dyn ChatService, user_id: &str) -> Result<Identity> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(BoloError::Config("user_id must not be empty".to_string()));
        }

        let identity = service.login(user_id).await?;

        self.storage.set_many(&[
            (USER_ID_KEY, identity.user_id.as_str()),
            (SESSION_ID_KEY, identity.session_id.as_str()),
        ])?;
        self.set_current(Some(identity.clone()))?;

        tracing::info!(
            user_id = %identity.user_id,
            session_id = %identity.session_id,
            "Logged in"
        );
        Ok(identity)
    }

    /// Forget the identity in memory and in storage.
    pub fn logout(&self) -> Result<()> {
        self.set_current(None)?;
        self.storage.remove(USER_ID_KEY)?;
        self.storage.remove(SESSION_ID_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
