use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;

use adflow_core::backend::CompletionBackend;
use adflow_core::ids::SessionId;
use adflow_engine::{Orchestrator, OrchestratorConfig};

use crate::error::StoreError;
use crate::history::HistoryLog;

/// A client-scoped container: exactly one orchestrator plus the session's
/// history. Ephemeral — lives for the process lifetime unless evicted.
pub struct Session {
    pub id: SessionId,
    pub orchestrator: Orchestrator,
    pub history: HistoryLog,
    last_active: RwLock<Instant>,
}

impl Session {
    fn new(id: SessionId, backend: Arc<dyn CompletionBackend>, config: OrchestratorConfig) -> Self {
        Self {
            id,
            orchestrator: Orchestrator::new(backend, config),
            history: HistoryLog::new(),
            last_active: RwLock::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_active.write() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.read().elapsed()
    }
}

/// Process-wide session map, constructed explicitly at service start.
///
/// A session id, once issued, maps to at most one live orchestrator; the
/// map's entry API keeps creation and eviction atomic per id.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    backend: Arc<dyn CompletionBackend>,
    config: OrchestratorConfig,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: OrchestratorConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            backend,
            config,
        }
    }

    /// Allocate a fresh session: new unique id, new worker set, empty
    /// history.
    pub fn create(&self) -> Arc<Session> {
        let id = SessionId::new();
        let session = Arc::new(Session::new(
            id.clone(),
            Arc::clone(&self.backend),
            self.config.clone(),
        ));
        self.sessions.insert(id.clone(), Arc::clone(&session));
        tracing::info!(session_id = %id, "session created");
        session
    }

    /// Return the existing session or transparently create one for an
    /// unknown id. Deliberately lenient — the strict variant is `require`.
    pub fn get_or_create(&self, id: &SessionId) -> Arc<Session> {
        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, "session created for unknown id");
                Arc::new(Session::new(
                    id.clone(),
                    Arc::clone(&self.backend),
                    self.config.clone(),
                ))
            })
            .clone();
        session.touch();
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|s| Arc::clone(&s));
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    /// Strict lookup: unknown ids fail with `SessionNotFound`.
    pub fn require(&self, id: &SessionId) -> Result<Arc<Session>, StoreError> {
        self.get(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    /// Release a session's state. A later `get_or_create` for the same id
    /// builds a fresh session; prior history is not recoverable.
    pub fn destroy(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "session destroyed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evict sessions idle longer than `max_idle`. Returns the eviction
    /// count.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let keep = session.idle_for() <= max_idle;
            if !keep {
                tracing::info!(session_id = %id, "evicting idle session");
            }
            keep
        });
        before - self.sessions.len()
    }
}

/// Periodic idle-session sweep. A `max_idle` of zero disables eviction.
pub fn start_eviction_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if max_idle.is_zero() {
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(max_idle);
            if evicted > 0 {
                tracing::info!(evicted, "idle session sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adflow_llm::MockBackend;

    fn registry() -> SessionRegistry {
        let backend = Arc::new(MockBackend::new(vec![]));
        SessionRegistry::new(backend, OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn create_allocates_unique_ids() {
        let registry = registry();
        let a = registry.create();
        let b = registry.create();
        assert_ne!(a.id, b.id);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn get_or_create_returns_same_session() {
        let registry = registry();
        let created = registry.create();

        let first = registry.get_or_create(&created.id);
        let second = registry.get_or_create(&created.id);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &created));
    }

    #[tokio::test]
    async fn get_or_create_tolerates_unknown_id() {
        let registry = registry();
        let id = SessionId::from_raw("client-invented-id");

        let session = registry.get_or_create(&id);
        assert_eq!(session.id, id);
        assert_eq!(registry.len(), 1);
        // Subsequent lookups see the same orchestrator instance.
        assert!(Arc::ptr_eq(&session, &registry.get_or_create(&id)));
    }

    #[tokio::test]
    async fn require_fails_for_unknown_id() {
        let registry = registry();
        let result = registry.require(&SessionId::new());
        assert!(matches!(result, Err(StoreError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn destroy_releases_state() {
        let registry = registry();
        let session = registry.create();
        session.history.append(adflow_core::history::Role::User, "hello");

        assert!(registry.destroy(&session.id));
        assert!(!registry.destroy(&session.id));
        assert!(registry.require(&session.id).is_err());

        // A fresh session for the same id carries no prior history.
        let fresh = registry.get_or_create(&session.id);
        assert!(fresh.history.is_empty());
        assert!(!Arc::ptr_eq(&fresh, &session));
    }

    #[tokio::test]
    async fn evict_idle_removes_only_stale_sessions() {
        let registry = registry();
        let stale = registry.create();
        let fresh = registry.create();

        tokio::time::sleep(Duration::from_millis(50)).await;
        fresh.touch();

        let evicted = registry.evict_idle(Duration::from_millis(25));
        assert_eq!(evicted, 1);
        assert!(registry.require(&stale.id).is_err());
        assert!(registry.require(&fresh.id).is_ok());
    }

    #[tokio::test]
    async fn access_resets_idle_clock() {
        let registry = registry();
        let session = registry.create();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // A strict lookup touches the session, rescuing it from eviction.
        let _ = registry.require(&session.id).unwrap();
        assert_eq!(registry.evict_idle(Duration::from_millis(25)), 0);
    }
}
