//! Append-only message log of the current session.

use std::sync::Mutex;

use tokio::sync::watch;

use bolo_core::types::Turn;

/// Ordered turns of the live conversation.
///
/// Turns are only ever appended; the log is cleared as a whole on logout.
/// Every change bumps a version observers can follow.
#[derive(Debug)]
pub struct MessageLog {
    turns: Mutex<Vec<Turn>>,
    version: watch::Sender<u64>,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            turns: Mutex::new(Vec::new()),
            version,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Turn>> {
        match self.turns.lock() {
            Ok(turns) => turns,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Append a turn, returning its position.
    pub fn push(&self, turn: Turn) -> usize {
        let index = {
            let mut turns = self.lock();
            turns.push(turn);
            turns.len() - 1
        };
        self.bump();
        index
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.lock().clone()
    }

    /// Turns appended at or after `index`.
    pub fn since(&self, index: usize) -> Vec<Turn> {
        self.lock().iter().skip(index).cloned().collect()
    }

    pub fn last(&self) -> Option<Turn> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.bump();
    }

    /// Follow changes to the log.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let log = MessageLog::new();
        assert_eq!(log.push(Turn::user("population of Delhi?")), 0);
        assert_eq!(log.push(Turn::bot("21.75 million")), 1);

        assert_eq!(
            log.turns(),
            vec![Turn::user("population of Delhi?"), Turn::bot("21.75 million")]
        );
        assert_eq!(log.since(1), vec![Turn::bot("21.75 million")]);
        assert_eq!(log.last(), Some(Turn::bot("21.75 million")));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let log = MessageLog::new();
        let mut rx = log.subscribe();

        log.push(Turn::user("hello"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);

        log.clear();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 2);
        assert!(log.is_empty());
    }
}
