// ABOUTME: In-process session store backed by a concurrent map with idle expiry
// ABOUTME: Writes are visible to the next read immediately; expired entries are evicted on access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{SessionId, SessionStore};
use crate::auth::state::AuthenticationState;
use crate::database_plugins::StorageResult;

struct StoredSession {
    state: AuthenticationState,
    last_seen: DateTime<Utc>,
}

/// Session store kept in process memory
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, StoredSession>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Store whose sessions expire after `ttl` without access
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Number of stored sessions, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session idle for longer than the TTL
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.last_seen > cutoff);
        before.saturating_sub(self.sessions.len())
    }

    /// Start a background task purging expired sessions every `period`
    ///
    /// The task holds a weak reference and ends once the store is dropped.
    #[must_use]
    pub fn spawn_cleanup(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let period = period.max(std::time::Duration::from_millis(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("session store dropped, stopping cleanup task");
                    break;
                };
                let removed = store.purge_expired();
                if removed > 0 {
                    debug!("Cleaned up {removed} expired sessions");
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, id: &SessionId, state: AuthenticationState) -> StorageResult<()> {
        self.sessions.insert(
            id.clone(),
            StoredSession {
                state,
                last_seen: Utc::now(),
            },
        );
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> StorageResult<AuthenticationState> {
        let now = Utc::now();
        if let Some(mut session) = self.sessions.get_mut(id) {
            if now - session.last_seen <= self.ttl {
                session.last_seen = now;
                return Ok(session.state.clone());
            }
        }

        // Guard from get_mut is released before removal
        if self
            .sessions
            .remove_if(id, |_, session| now - session.last_seen > self.ttl)
            .is_some()
        {
            debug!(session = ?id, "session expired");
        }
        Ok(AuthenticationState::Unauthenticated)
    }

    async fn remove(&self, id: &SessionId) -> StorageResult<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_session_is_unauthenticated() {
        let store = InMemorySessionStore::new(Duration::minutes(30));
        let state = store.load(&SessionId::generate()).await.unwrap();
        assert!(matches!(state, AuthenticationState::Unauthenticated));
    }

    #[tokio::test]
    async fn test_expired_session_is_evicted() {
        let store = InMemorySessionStore::new(Duration::zero());
        let id = SessionId::generate();
        store
            .save(&id, AuthenticationState::Unauthenticated)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let state = store.load(&id).await.unwrap();
        assert!(matches!(state, AuthenticationState::Unauthenticated));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_drops_sessions_never_loaded_again() {
        let store = InMemorySessionStore::new(Duration::zero());
        for _ in 0..100 {
            store
                .save(&SessionId::generate(), AuthenticationState::Unauthenticated)
                .await
                .unwrap();
        }
        assert_eq!(store.len(), 100);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(store.purge_expired(), 100);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_keeps_live_sessions() {
        let store = InMemorySessionStore::new(Duration::minutes(30));
        store
            .save(&SessionId::generate(), AuthenticationState::Unauthenticated)
            .await
            .unwrap();
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_abandoned_sessions() {
        let store = Arc::new(InMemorySessionStore::new(Duration::zero()));
        for _ in 0..10 {
            store
                .save(&SessionId::generate(), AuthenticationState::Unauthenticated)
                .await
                .unwrap();
        }
        let cleanup = store.spawn_cleanup(std::time::Duration::from_millis(10));

        for _ in 0..100 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(store.is_empty());

        drop(store);
        tokio::time::timeout(std::time::Duration::from_secs(1), cleanup)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_discards_state() {
        let store = InMemorySessionStore::new(Duration::minutes(30));
        let id = SessionId::generate();
        store
            .save(&id, AuthenticationState::Unauthenticated)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        store.remove(&id).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.purge_expired(), 0);
    }
}
