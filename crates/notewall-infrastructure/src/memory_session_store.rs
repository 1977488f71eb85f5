//! In-memory session store with idle expiry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use notewall_core::auth::{SessionData, SessionStore, SessionToken};
use notewall_core::error::Result;

/// Default idle lifetime of a session (24 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1440);

struct SessionEntry {
    data: SessionData,
    touched_at: Instant,
}

/// Process-local session storage.
///
/// A session expires once it has gone `ttl` without being loaded or stored.
/// Expired entries read as absent immediately; [`purge_expired`] reclaims
/// their memory.
///
/// [`purge_expired`]: MemorySessionStore::purge_expired
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, SessionEntry>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Removes every expired session and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.touched_at.elapsed() < ttl);
        before - sessions.len()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &SessionToken) -> Result<Option<SessionData>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token) {
            None => return Ok(None),
            Some(entry) if entry.touched_at.elapsed() < self.ttl => {
                entry.touched_at = Instant::now();
                return Ok(Some(entry.data.clone()));
            }
            Some(_) => {}
        }

        sessions.remove(token);
        tracing::debug!("Dropped expired session");
        Ok(None)
    }

    async fn store(&self, token: &SessionToken, data: SessionData) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            SessionEntry {
                data,
                touched_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn destroy(&self, token: &SessionToken) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        Ok(())
    }
}
