use serde::{Deserialize, Serialize};

use crate::error::{BoloError, Result};

// =============================================================================
// Identity
// =============================================================================

/// A logged-in user together with the server-issued session.
///
/// Both fields are mutually required: a session without an identity is
/// invalid, so construction rejects empty values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub session_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let session_id = session_id.into();
        if user_id.trim().is_empty() {
            return Err(BoloError::InvalidResponse("user_id is empty".to_string()));
        }
        if session_id.trim().is_empty() {
            return Err(BoloError::InvalidResponse(
                "session_id is empty".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            session_id,
        })
    }
}

// =============================================================================
// Turns
// =============================================================================

/// One message in the conversation, tagged as user- or bot-authored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub text: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// A single stored exchange inside a past session.
///
/// The service has produced two shapes over time: role-tagged rows
/// (`role`, `message`, `created_at`) and paired rows (`user`, `bot`,
/// `timestamp`). Every field is optional so either shape deserializes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HistoryEntry {
    /// Normalize this entry into zero, one or two turns.
    pub fn turns(&self) -> Vec<Turn> {
        let mut out = Vec::new();
        if let Some(message) = self.message.as_deref() {
            let is_user = self.role.as_deref() == Some("user");
            out.push(Turn {
                text: message.to_string(),
                is_user,
            });
        }
        if let Some(user) = self.user.as_deref() {
            out.push(Turn::user(user));
        }
        if let Some(bot) = self.bot.as_deref() {
            out.push(Turn::bot(bot));
        }
        out
    }
}

/// One past session and its exchanges, read-only once fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub session_id: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl HistoryRecord {
    /// All turns of this session in chronological order.
    pub fn turns(&self) -> Vec<Turn> {
        self.history.iter().flat_map(HistoryEntry::turns).collect()
    }
}

// =============================================================================
// Languages
// =============================================================================

/// A selectable language.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageOption {
    pub code: String,
    pub name: String,
}

impl LanguageOption {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_requires_both_fields() {
        assert!(Identity::new("alice", "s1").is_ok());
        assert!(Identity::new("", "s1").is_err());
        assert!(Identity::new("alice", "  ").is_err());
    }

    #[test]
    fn test_turn_serializes_is_user_flag() {
        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi","isUser":true}"#);
    }

    #[test]
    fn test_history_record_role_shape() {
        let json = r#"{
            "session_id": "s1",
            "history": [
                {"role": "user", "message": "population of Delhi?", "created_at": "2024-01-01"},
                {"role": "bot", "message": "21.75 million", "created_at": "2024-01-01"}
            ]
        }"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.turns(),
            vec![Turn::user("population of Delhi?"), Turn::bot("21.75 million")]
        );
    }

    #[test]
    fn test_history_record_paired_shape() {
        let json = r#"{
            "session_id": "s2",
            "history": [{"user": "hello", "bot": "namaste", "timestamp": "t"}]
        }"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.turns(), vec![Turn::user("hello"), Turn::bot("namaste")]);
    }

    #[test]
    fn test_history_record_missing_history_is_empty() {
        let record: HistoryRecord = serde_json::from_str(r#"{"session_id": "s3"}"#).unwrap();
        assert!(record.history.is_empty());
        assert!(record.turns().is_empty());
    }

    #[test]
    fn test_history_entry_null_aggregate_row() {
        // A session with no rows aggregates to a single all-null entry.
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"role": null, "message": null, "created_at": null}"#).unwrap();
        assert!(entry.turns().is_empty());
    }
}
