//! Session store trait.

use async_trait::async_trait;

use super::session::{SessionData, SessionToken};
use crate::error::Result;

/// Storage backend for server-side sessions.
///
/// Expiry policy belongs to the implementation; an expired session must read
/// back as `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Gets a session by token. Returns `None` if it does not exist.
    async fn load(&self, token: &SessionToken) -> Result<Option<SessionData>>;

    /// Creates or replaces a session and refreshes its expiry.
    async fn store(&self, token: &SessionToken, data: SessionData) -> Result<()>;

    /// Removes a session entirely. Missing sessions are not an error.
    async fn destroy(&self, token: &SessionToken) -> Result<()>;
}
