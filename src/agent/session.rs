//! In-process conversation session store
//!
//! Sessions are handed out as owned mutex guards: the run that checks a
//! session out is its only writer until the guard drops at the end of the
//! turn. Concurrent turns against the same scope queue on the mutex instead
//! of racing.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::domain::{ConversationSession, Message};

/// Store of live conversation sessions, keyed by opaque scope
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, scope: &str) -> Arc<Mutex<ConversationSession>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(cell) = sessions.get(scope) {
                return cell.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationSession::new(scope))))
            .clone()
    }

    /// Check a session out for exclusive mutation during one turn
    ///
    /// Waits until any in-flight turn for the same scope releases its guard.
    pub async fn checkout(&self, scope: &str) -> OwnedMutexGuard<ConversationSession> {
        self.entry(scope).await.lock_owned().await
    }

    /// Read-only copy of a session's messages, for display consumers
    pub async fn snapshot(&self, scope: &str) -> Option<Vec<Message>> {
        let cell = {
            let sessions = self.sessions.read().await;
            sessions.get(scope).cloned()
        }?;
        let session = cell.lock().await;
        Some(session.messages.clone())
    }

    /// Drop a session entirely
    pub async fn remove(&self, scope: &str) -> bool {
        self.sessions.write().await.remove(scope).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn checkout_creates_on_first_use() {
        let store = SessionStore::new();
        {
            let mut session = store.checkout("u1/default").await;
            session.push(Message::user("hello"));
        }
        let messages = store.snapshot("u1/default").await.expect("exists");
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn second_writer_waits_for_first() {
        let store = Arc::new(SessionStore::new());
        let guard = store.checkout("u1/default").await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.checkout("u1/default").await;
                session.push(Message::user("second"));
            })
        };

        // The contender cannot make progress while the guard is held.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender finishes");

        let messages = store.snapshot("u1/default").await.expect("exists");
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let store = SessionStore::new();
        store.checkout("u1/a").await.push(Message::user("a"));
        store.checkout("u1/b").await.push(Message::user("b"));

        assert_eq!(store.len().await, 2);
        assert_eq!(store.snapshot("u1/a").await.expect("a").len(), 1);
        assert!(store.remove("u1/a").await);
        assert!(store.snapshot("u1/a").await.is_none());
    }
}
