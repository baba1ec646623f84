//! Session registry: one protocol handler per `Mcp-Session-Id`.
//!
//! Clients may vanish without sending `DELETE /mcp`, so a session that sees
//! no traffic for the idle timeout is dropped, either lazily on lookup or by
//! the periodic sweep the HTTP transport runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;

use capstan::Dispatcher;

use crate::config::DEFAULT_SESSION_IDLE_SECS;
use crate::protocol::ProtocolHandler;

pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub handler: Arc<ProtocolHandler>,
    last_seen: Mutex<Instant>,
}

impl Session {
    async fn touch(&self) {
        *self.last_seen.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_seen.lock().await.elapsed()
    }
}

/// Sessions share the dispatcher; each gets its own handshake state and
/// in-flight table.
pub struct SessionRegistry {
    dispatcher: Arc<Dispatcher>,
    request_timeout: Duration,
    idle_timeout: Duration,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(dispatcher: Arc<Dispatcher>, request_timeout: Duration) -> Self {
        Self {
            dispatcher,
            request_timeout,
            idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Open a session under a fresh UUID v4.
    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            handler: Arc::new(ProtocolHandler::new(
                Arc::clone(&self.dispatcher),
                self.request_timeout,
            )),
            last_seen: Mutex::new(Instant::now()),
        });

        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), Arc::clone(&session));

        tracing::info!("Session {} opened", session.id);
        session
    }

    /// Look up a live session and mark it as seen. An idle one is closed
    /// instead and reported as unknown.
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.lock().await.get(id).cloned()?;

        if session.idle_for().await > self.idle_timeout {
            self.close(id, "idle").await;
            return None;
        }

        session.touch().await;
        Some(session)
    }

    /// Close a session, cancelling whatever it still has running.
    pub async fn remove(&self, id: &str) -> bool {
        self.close(id, "closed").await
    }

    /// Close every session idle for longer than the idle timeout.
    pub async fn expire_idle(&self) -> usize {
        let sessions: Vec<Arc<Session>> = self.sessions.lock().await.values().cloned().collect();

        let mut expired = 0;
        for session in sessions {
            if session.idle_for().await > self.idle_timeout && self.close(&session.id, "idle").await {
                expired += 1;
            }
        }
        expired
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn close(&self, id: &str, why: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id);
        match removed {
            Some(session) => {
                session.handler.cancel_all().await;
                let age = Utc::now() - session.created_at;
                tracing::info!("Session {id} {why} after {}s", age.num_seconds());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capstan::Registry;

    fn registry() -> SessionRegistry {
        let dispatcher = Arc::new(Dispatcher::new(Registry::builder().build()));
        SessionRegistry::new(dispatcher, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_uuids() {
        let sessions = registry();
        let a = sessions.create().await;
        let b = sessions.create().await;

        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
        assert_eq!(sessions.count().await, 2);
        assert!(Arc::ptr_eq(&sessions.get(&a.id).await.unwrap(), &a));
    }

    #[tokio::test]
    async fn test_remove_session() {
        let sessions = registry();
        let s = sessions.create().await;

        assert!(sessions.remove(&s.id).await);
        assert!(!sessions.remove(&s.id).await);
        assert!(sessions.get(&s.id).await.is_none());
        assert_eq!(sessions.count().await, 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_swept() {
        let sessions = registry().with_idle_timeout(Duration::from_millis(100));
        let idle = sessions.create().await;
        let busy = sessions.create().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(sessions.get(&busy.id).await.is_some());
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(sessions.expire_idle().await, 1);
        assert!(sessions.get(&idle.id).await.is_none());
        assert!(sessions.get(&busy.id).await.is_some());
    }

    #[tokio::test]
    async fn test_idle_session_rejected_on_lookup() {
        let sessions = registry().with_idle_timeout(Duration::from_millis(10));
        let s = sessions.create().await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(sessions.get(&s.id).await.is_none());
        assert_eq!(sessions.count().await, 0);
    }
}
