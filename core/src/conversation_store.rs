//! In-memory conversation store
//!
//! Keeps conversations between runs, keyed by id. An entry idle for longer
//! than the TTL is dropped on the next sweep or lookup. Stored transcripts
//! are capped; trimming drops the oldest turns and then keeps dropping until
//! the transcript starts with a user turn, so a tool result never loses its
//! assistant turn.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::config::ConversationConfig;
use crate::conversation::{ConversationHandle, Role, Turn};

#[derive(Debug)]
struct StoredConversation {
    turns: Vec<Turn>,
    last_access: Instant,
}

#[derive(Debug)]
pub struct ConversationStore {
    entries: DashMap<Uuid, StoredConversation>,
    ttl: Duration,
    max_turns: usize,
}

impl ConversationStore {
    pub fn new(ttl: Duration, max_turns: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_turns,
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.ttl(), config.max_turns)
    }

    /// Continue a stored conversation, or start a fresh one
    ///
    /// Unknown and expired ids get a fresh conversation with a new id.
    pub fn open(&self, id: Option<Uuid>) -> ConversationHandle {
        let Some(id) = id else {
            return ConversationHandle::new();
        };

        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(&id) {
            if now.duration_since(entry.last_access) <= self.ttl {
                entry.last_access = now;
                return ConversationHandle::with_turns(id, entry.turns.clone());
            }
        }

        if self.entries.remove(&id).is_some() {
            debug!(conversation_id = %id, "Conversation expired");
        }
        ConversationHandle::new()
    }

    /// Store the transcript under the handle's id
    pub fn save(&self, handle: ConversationHandle) {
        let turns = trim_turns(handle.turns, self.max_turns);
        self.entries.insert(
            handle.id,
            StoredConversation {
                turns,
                last_access: Instant::now(),
            },
        );
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drop every conversation idle past the TTL; returns how many
    pub fn expire_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_access) <= self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Expired idle conversations");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn trim_turns(mut turns: Vec<Turn>, max_turns: usize) -> Vec<Turn> {
    if turns.len() <= max_turns {
        return turns;
    }
    let excess = turns.len() - max_turns;
    turns.drain(..excess);
    let first_user = turns
        .iter()
        .position(|turn| turn.role() == Role::User)
        .unwrap_or(turns.len());
    turns.drain(..first_user);
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::ToolInvocation;
    use serde_json::json;

    fn store() -> ConversationStore {
        ConversationStore::new(Duration::from_secs(60), 4)
    }

    #[test]
    fn test_open_without_id_is_fresh() {
        let handle = store().open(None);
        assert!(handle.turns.is_empty());
    }

    #[test]
    fn test_unknown_id_gets_new_conversation() {
        let requested = Uuid::new_v4();
        let handle = store().open(Some(requested));
        assert_ne!(handle.id, requested);
        assert!(handle.turns.is_empty());
    }

    #[test]
    fn test_save_then_open_round_trip() {
        let store = store();
        let mut handle = store.open(None);
        handle.turns.push(Turn::user("hello"));
        let id = handle.id;
        store.save(handle);

        let reopened = store.open(Some(id));
        assert_eq!(reopened.id, id);
        assert_eq!(reopened.turns, vec![Turn::user("hello")]);
    }

    #[test]
    fn test_trim_drops_orphaned_tool_results() {
        let inv = ToolInvocation::from_value("c1", "get_story_tasks", json!({}));
        let turns = vec![
            Turn::user("first"),
            Turn::assistant(None, vec![inv.clone()]),
            Turn::tool_result(&inv, json!([])),
            Turn::assistant(Some("done".into()), vec![]),
            Turn::user("second"),
            Turn::assistant(Some("ok".into()), vec![]),
        ];
        let trimmed = trim_turns(turns, 4);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0], Turn::user("second"));
    }

    #[test]
    fn test_remove() {
        let store = store();
        let handle = ConversationHandle::new();
        let id = handle.id;
        store.save(handle);
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_conversations_expire() {
        let store = store();
        let stale = ConversationHandle::new();
        let stale_id = stale.id;
        store.save(stale);

        tokio::time::advance(Duration::from_secs(45)).await;
        store.save(ConversationHandle::new());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.expire_idle(), 1);
        assert_eq!(store.len(), 1);
        assert_ne!(store.open(Some(stale_id)).id, stale_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_refreshes_idle_timer() {
        let store = store();
        let handle = ConversationHandle::new();
        let id = handle.id;
        store.save(handle);

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(store.open(Some(id)).id, id);
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(store.expire_idle(), 0);
    }
}
