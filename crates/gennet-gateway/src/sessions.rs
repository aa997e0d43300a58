//! In-memory chat sessions with age and size bounds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use gennet_core::config::SessionConfig;
use gennet_core::types::Message;
use serde::Serialize;

/// One conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ChatSession {
    fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
        }
    }
}

/// Session map bounded by `max_sessions` and idle age.
///
/// Expired sessions are purged whenever the store is touched; when it is full
/// the least recently active session is evicted.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, ChatSession>>,
    enabled: bool,
    max_sessions: usize,
    max_age: Duration,
    history_window: usize,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            enabled: config.enabled,
            max_sessions: config.max_sessions.max(1),
            max_age: Duration::seconds(
                i64::try_from(config.max_age_secs)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000),
            ),
            history_window: config.history_window.max(1),
        }
    }

    /// `session_<unix>_<8 hex>`
    pub fn generate_id() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", Utc::now().timestamp(), &suffix[..8])
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append a user message and return the session id plus the recent
    /// history (ending with this message) to send upstream.
    pub fn begin_turn(&self, session_id: Option<&str>, user_message: &str) -> (String, Vec<Message>) {
        self.begin_turn_at(session_id, user_message, Utc::now())
    }

    fn begin_turn_at(&self, session_id: Option<&str>, user_message: &str, now: DateTime<Utc>) -> (String, Vec<Message>) {
        let id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(Self::generate_id);

        if !self.enabled {
            return (id, vec![Message::user(user_message)]);
        }

        let mut sessions = self.lock();
        self.purge_expired(&mut sessions, now);
        if !sessions.contains_key(&id) && sessions.len() >= self.max_sessions {
            Self::evict_oldest(&mut sessions);
        }

        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| ChatSession::new(id.clone(), now));
        session.last_activity = now;
        session.messages.push(Message::user(user_message));

        let start = session.messages.len().saturating_sub(self.history_window);
        (id, session.messages[start..].to_vec())
    }

    /// Append the assistant reply to a session, if it still exists.
    pub fn record_reply(&self, session_id: &str, reply: &str) {
        if !self.enabled {
            return;
        }
        let mut sessions = self.lock();
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_activity = Utc::now();
            session.messages.push(Message::assistant(reply));
        }
    }

    pub fn get(&self, session_id: &str) -> Option<ChatSession> {
        self.lock().get(session_id).cloned()
    }

    pub fn message_count(&self, session_id: &str) -> usize {
        self.lock().get(session_id).map_or(0, |s| s.messages.len())
    }

    /// Number of live sessions (expired ones are dropped first).
    pub fn active_count(&self) -> usize {
        let mut sessions = self.lock();
        self.purge_expired(&mut sessions, Utc::now());
        sessions.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age.num_seconds()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChatSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, ChatSession>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_activity <= self.max_age);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!("🧹 Purged {purged} expired session(s)");
        }
    }

    fn evict_oldest(sessions: &mut HashMap<String, ChatSession>) {
        let oldest = sessions
            .values()
            .min_by_key(|s| s.last_activity)
            .map(|s| s.id.clone());
        if let Some(id) = oldest {
            sessions.remove(&id);
            tracing::debug!("Session store full, evicted {id}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gennet_core::types::Role;

    fn store(max_sessions: usize, max_age_secs: u64, history_window: usize) -> SessionStore {
        SessionStore::new(&SessionConfig {
            enabled: true,
            max_sessions,
            max_age_secs,
            history_window,
        })
    }

    #[test]
    fn test_generated_id_format() {
        let id = SessionStore::generate_id();
        let parts: Vec<_> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_history_window() {
        let store = store(10, 3600, 3);
        let (id, _) = store.begin_turn(Some("s1"), "one");
        store.record_reply(&id, "reply one");
        store.begin_turn(Some("s1"), "two");
        store.record_reply(&id, "reply two");
        let (_, history) = store.begin_turn(Some("s1"), "three");

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "two");
        assert_eq!(history[2].content, "three");
        assert_eq!(history[2].role, Role::User);
        assert_eq!(store.message_count("s1"), 5);
    }

    #[test]
    fn test_new_session_gets_generated_id() {
        let store = store(10, 3600, 8);
        let (id, history) = store.begin_turn(None, "hello");
        assert!(id.starts_with("session_"));
        assert_eq!(history.len(), 1);
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn test_expired_sessions_purged() {
        let store = store(10, 60, 8);
        let t0 = Utc::now();
        store.begin_turn_at(Some("old"), "hi", t0);
        store.begin_turn_at(Some("new"), "hi", t0 + Duration::seconds(50));
        store.begin_turn_at(Some("newer"), "hi", t0 + Duration::seconds(100));
        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());

        // an expired id starts over
        let (_, history) = store.begin_turn_at(Some("new"), "again", t0 + Duration::seconds(200));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_full_store_evicts_least_recent() {
        let store = store(2, 3600, 8);
        let t0 = Utc::now();
        store.begin_turn_at(Some("a"), "hi", t0);
        store.begin_turn_at(Some("b"), "hi", t0 + Duration::seconds(1));
        store.begin_turn_at(Some("a"), "again", t0 + Duration::seconds(2));
        store.begin_turn_at(Some("c"), "hi", t0 + Duration::seconds(3));

        assert!(store.get("a").is_some());
        assert!(store.get("b").is_none());
        assert!(store.get("c").is_some());
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_disabled_store_keeps_nothing() {
        let store = SessionStore::new(&SessionConfig {
            enabled: false,
            ..Default::default()
        });
        let (id, history) = store.begin_turn(Some("s"), "hi");
        assert_eq!(id, "s");
        assert_eq!(history.len(), 1);
        store.record_reply("s", "hello");
        assert_eq!(store.active_count(), 0);
    }
}
