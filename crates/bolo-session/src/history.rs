//! Past sessions of the logged-in user.

use std::sync::Mutex;

use bolo_client::ChatService;
use bolo_core::types::HistoryRecord;

/// Read-only batch of past sessions, fetched once per login.
#[derive(Debug, Default)]
pub struct HistoryCache {
    records: Mutex<Vec<HistoryRecord>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the history of `user_id`, replacing whatever was cached.
    ///
    /// A failed fetch is not fatal: it is logged and the cache is left empty
    /// so the user can still converse.
    pub async fn load(&self, service: &dyn ChatService, user_id: &str) -> usize {
        let records = match service.user_history(user_id).await {
            Ok(records) => {
                tracing::info!(user_id = %user_id, sessions = records.len(), "History loaded");
                records
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "History fetch failed, using empty history");
                Vec::new()
            }
        };
        let count = records.len();
        if let Ok(mut cached) = self.records.lock() {
            *cached = records;
        }
        count
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn find(&self, session_id: &str) -> Option<HistoryRecord> {
        self.records
            .lock()
            .ok()?
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut cached) = self.records.lock() {
            cached.clear();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bolo_client::MockChatService;
    use bolo_core::types::HistoryEntry;

    fn record(session_id: &str, user: &str, bot: &str) -> HistoryRecord {
        HistoryRecord {
            session_id: session_id.to_string(),
            history: vec![HistoryEntry {
                user: Some(user.to_string()),
                bot: Some(bot.to_string()),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_load_keeps_service_order() {
        let service = MockChatService::new().with_histories(vec![
            record("s2", "sex ratio of Goa?", "973"),
            record("s1", "population of Bihar?", "104 million"),
        ]);
        let cache = HistoryCache::new();

        assert_eq!(cache.load(&service, "alice").await, 2);
        let ids: Vec<String> = cache.records().into_iter().map(|r| r.session_id).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
        assert!(cache.find("s1").is_some());
        assert!(cache.find("s9").is_none());
    }

    #[tokio::test]
    async fn test_failed_load_is_empty() {
        let service = MockChatService::new().failing_history();
        let cache = HistoryCache::new();
        assert_eq!(cache.load(&service, "alice").await, 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_replaces_stale_records() {
        let cache = HistoryCache::new();
        let ok = MockChatService::new().with_histories(vec![record("s1", "a", "b")]);
        cache.load(&ok, "alice").await;
        assert_eq!(cache.len(), 1);

        let failing = MockChatService::new().failing_history();
        cache.load(&failing, "bob").await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = HistoryCache::new();
        let service = MockChatService::new().with_histories(vec![record("s1", "a", "b")]);
        cache.load(&service, "alice").await;
        cache.clear();
        assert!(cache.is_empty());
    }
}
