//! Process-wide session map.

use std::collections::HashMap;

use conductor_primitives::truncate_chars;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::message::Message;

const TRUNCATION_MARKER: &str = "…";

#[derive(Debug)]
struct SessionEntry {
    messages: Vec<Message>,
    last_touched: Instant,
}

/// Shared map of session id to bounded conversation history.
///
/// Sessions are created on first write and live until the idle-expiry sweep
/// removes them. Each operation is individually atomic; a whole turn is not.
#[derive(Debug)]
pub struct SessionStore {
    config: SessionConfig,
    inner: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    /// Creates an empty store with the given caps.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a snapshot of the session's history, oldest first.
    ///
    /// Reading does not create the session; unknown ids yield an empty list.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let guard = self.inner.read().await;
        guard
            .get(session_id)
            .map(|entry| entry.messages.clone())
            .unwrap_or_default()
    }

    /// Overwrites the session's history with the caller's updated copy,
    /// applying the message-count and per-message character caps.
    ///
    /// Turns are read-modify-write: the orchestrator snapshots the history
    /// with [`SessionStore::history`], appends the turn's messages to its
    /// copy, and writes the copy back here. Two concurrent turns on the same
    /// session id can therefore snapshot the same state, and the later
    /// write-back wins, dropping the earlier turn's messages. Callers that
    /// need strict per-session ordering must serialize requests for a
    /// session id externally; the store itself only guarantees that each
    /// individual operation is atomic.
    pub async fn replace(&self, session_id: &str, messages: Vec<Message>) {
        let messages = self.clamp(session_id, messages);
        let mut guard = self.inner.write().await;
        match guard.get_mut(session_id) {
            Some(entry) => {
                entry.messages = messages;
                entry.last_touched = Instant::now();
            }
            None => {
                guard.insert(
                    session_id.to_owned(),
                    SessionEntry {
                        messages,
                        last_touched: Instant::now(),
                    },
                );
            }
        }
    }

    /// Removes sessions untouched for longer than the configured idle TTL
    /// and returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.config.idle_ttl();
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, entry| now.duration_since(entry.last_touched) <= ttl);
        let removed = before - guard.len();
        if removed > 0 {
            info!(removed, "expired idle sessions");
        }
        removed
    }

    /// Returns whether the session exists.
    pub async fn contains(&self, session_id: &str) -> bool {
        let guard = self.inner.read().await;
        guard.contains_key(session_id)
    }

    /// Returns utilisation counters across all sessions.
    pub async fn stats(&self) -> SessionStats {
        let guard = self.inner.read().await;
        SessionStats {
            sessions: guard.len(),
            messages: guard.values().map(|entry| entry.messages.len()).sum(),
        }
    }

    fn clamp(&self, session_id: &str, mut messages: Vec<Message>) -> Vec<Message> {
        let cap = self.config.max_messages().get();
        if messages.len() > cap {
            let dropped = messages.len() - cap;
            messages.drain(..dropped);
            debug!(session = %session_id, dropped, "trimmed oldest session messages");
        }
        let limit = self.config.max_message_chars().get();
        messages
            .into_iter()
            .map(|message| {
                Message::new(
                    message.role(),
                    truncate_chars(message.content(), limit, TRUNCATION_MARKER),
                )
            })
            .collect()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Snapshot of store utilisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of live sessions.
    pub sessions: usize,
    /// Messages retained across all sessions.
    pub messages: usize,
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn keeps_only_the_newest_messages() {
        let config =
            SessionConfig::default().with_max_messages(NonZeroUsize::new(4).expect("non-zero"));
        let store = SessionStore::new(config);

        for i in 0..7 {
            let mut history = store.history("s").await;
            history.push(Message::user(format!("m{i}")));
            store.replace("s", history).await;
        }

        let kept = store.history("s").await;
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].content(), "m3");
        assert_eq!(kept[3].content(), "m6");
    }

    #[tokio::test]
    async fn long_messages_are_truncated_with_a_marker() {
        let config = SessionConfig::default()
            .with_max_message_chars(NonZeroUsize::new(8).expect("non-zero"));
        let store = SessionStore::new(config);

        store
            .replace("s", vec![Message::assistant("a".repeat(20))])
            .await;

        let kept = store.history("s").await;
        assert_eq!(kept[0].content(), format!("{}…", "a".repeat(8)));
    }

    #[tokio::test]
    async fn reading_does_not_create_a_session() {
        let store = SessionStore::default();
        assert!(store.history("ghost").await.is_empty());
        assert!(!store.contains("ghost").await);
        assert_eq!(store.stats().await.sessions, 0);
    }

    #[tokio::test]
    async fn concurrent_turns_can_lose_updates() {
        let store = SessionStore::default();
        store.replace("s", vec![Message::user("first")]).await;

        // Two turns snapshot the same state before either writes back.
        let mut turn_a = store.history("s").await;
        let mut turn_b = store.history("s").await;

        turn_a.push(Message::assistant("from a"));
        store.replace("s", turn_a).await;

        turn_b.push(Message::assistant("from b"));
        store.replace("s", turn_b).await;

        let kept = store.history("s").await;
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].content(), "from b");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire_after_the_ttl() {
        let config = SessionConfig::default().with_idle_ttl(Duration::from_secs(60));
        let store = SessionStore::new(config);

        store.replace("old", vec![Message::user("hi")]).await;
        tokio::time::advance(Duration::from_secs(45)).await;
        store.replace("fresh", vec![Message::user("hello")]).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.evict_idle().await, 1);
        assert!(store.history("old").await.is_empty());
        assert_eq!(store.history("fresh").await.len(), 1);
        assert_eq!(store.stats().await.sessions, 1);
    }

    #[tokio::test]
    async fn stats_count_sessions_and_messages() {
        let store = SessionStore::default();
        store
            .replace("a", vec![Message::user("1"), Message::assistant("2")])
            .await;
        store.replace("b", vec![Message::user("3")]).await;

        let stats = store.stats().await;
        assert_eq!(stats, SessionStats { sessions: 2, messages: 3 });
    }
}
