//! Bookkeeping for delayed status transitions.
//!
//! Every pending transition is a spawned task tracked by the key of the
//! entity it will mutate. Tasks carry a ticket; a task whose ticket is no
//! longer current when it fires must not touch state.

use std::collections::HashMap;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Agent(String),
    ApiKey(String),
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Agent(id) => write!(f, "agent/{}", id),
            EntityKey::ApiKey(id) => write!(f, "api-key/{}", id),
        }
    }
}

#[derive(Debug)]
struct PendingTransition {
    ticket: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
pub struct TransitionScheduler {
    pending: HashMap<EntityKey, PendingTransition>,
    next_ticket: u64,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Tracks `handle` as the only pending transition for `key`, aborting any earlier one.
    pub fn track(&mut self, key: EntityKey, ticket: u64, handle: AbortHandle) {
        if let Some(previous) = self.pending.insert(key.clone(), PendingTransition { ticket, handle }) {
            previous.handle.abort();
            tracing::debug!("Replaced pending transition for {}", key);
        }
    }

    pub fn cancel(&mut self, key: &EntityKey) -> bool {
        match self.pending.remove(key) {
            Some(pending) => {
                pending.handle.abort();
                tracing::debug!("Cancelled pending transition for {}", key);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
        count
    }

    /// Claims the transition for a firing task. Returns false if the ticket
    /// was cancelled or superseded, in which case the task must do nothing.
    pub fn finish(&mut self, key: &EntityKey, ticket: u64) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.ticket == ticket => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, key: &EntityKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for TransitionScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sleeper() -> tokio::task::JoinHandle<()> {
        tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        })
    }

    #[tokio::test]
    async fn test_cancel_aborts_task() {
        let mut scheduler = TransitionScheduler::new();
        let key = EntityKey::ApiKey("k1".into());
        let task = sleeper();
        let ticket = scheduler.issue_ticket();
        scheduler.track(key.clone(), ticket, task.abort_handle());

        assert!(scheduler.is_pending(&key));
        assert!(scheduler.cancel(&key));
        assert!(!scheduler.cancel(&key));
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!scheduler.finish(&key, ticket));
    }

    #[tokio::test]
    async fn test_one_pending_transition_per_entity() {
        let mut scheduler = TransitionScheduler::new();
        let key = EntityKey::Agent("a1".into());

        let first = sleeper();
        let first_ticket = scheduler.issue_ticket();
        scheduler.track(key.clone(), first_ticket, first.abort_handle());

        let second = sleeper();
        let second_ticket = scheduler.issue_ticket();
        scheduler.track(key.clone(), second_ticket, second.abort_handle());

        assert_eq!(scheduler.pending_count(), 1);
        assert!(first.await.unwrap_err().is_cancelled());
        assert!(!scheduler.finish(&key, first_ticket));
        assert!(scheduler.finish(&key, second_ticket));
        assert_eq!(scheduler.pending_count(), 0);
        second.abort();
    }

    #[tokio::test]
    async fn test_drop_cancels_everything() {
        let task = sleeper();
        {
            let mut scheduler = TransitionScheduler::new();
            let ticket = scheduler.issue_ticket();
            scheduler.track(EntityKey::Agent("a1".into()), ticket, task.abort_handle());
        }
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_entity_key_display() {
        assert_eq!(EntityKey::Agent("7".into()).to_string(), "agent/7");
        assert_eq!(EntityKey::ApiKey("9".into()).to_string(), "api-key/9");
    }
}
