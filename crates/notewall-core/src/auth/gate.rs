//! The session gate: the board's only authorization boundary.

use serde_json::Value;
use sha2::{digest::Output, Digest, Sha256};

use super::session::{SessionData, AUTHED_KEY};
use crate::error::{NotewallError, Result};

/// Generic failure text shown after a rejected login.
pub const WRONG_PASSWORD: &str = "Wrong password.";

/// The shared board password.
///
/// `Debug` is redacted so the value cannot leak through logs or error chains.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// True when the value is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted,
    Denied,
}

impl LoginOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// One-shot message for the login form. Never persisted.
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Granted => None,
            Self::Denied => Some(WRONG_PASSWORD),
        }
    }
}

/// Proof that the current session passed the gate.
///
/// Only [`SessionGate::require_authenticated`] can construct one, so any code
/// path asking for `&Authenticated` cannot be reached by an anonymous client.
#[derive(Debug)]
pub struct Authenticated {
    _private: (),
}

/// Validates the shared secret and tracks the authenticated flag in a session.
pub struct SessionGate {
    secret_digest: Output<Sha256>,
}

impl SessionGate {
    /// Configures the gate with the shared secret.
    ///
    /// A blank secret is a configuration error; callers are expected to abort
    /// startup rather than serve requests.
    pub fn new(secret: Secret) -> Result<Self> {
        if secret.is_blank() {
            return Err(NotewallError::config("APP_PASSWORD is not set."));
        }

        Ok(Self {
            secret_digest: Sha256::digest(secret.as_bytes()),
        })
    }

    /// Compares `submitted` to the secret in time independent of where they differ.
    ///
    /// Both sides are hashed first so the comparison always runs over the same
    /// number of bytes regardless of input length.
    pub fn verify(&self, submitted: &str) -> bool {
        let submitted_digest = Sha256::digest(submitted.as_bytes());
        let diff = self
            .secret_digest
            .iter()
            .zip(submitted_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        std::hint::black_box(diff) == 0
    }

    /// Checks `submitted` and records the result in the session.
    ///
    /// A failed attempt stores an explicit `false`, which is distinct from a
    /// session that never tried.
    pub fn login(&self, session: &mut SessionData, submitted: &str) -> LoginOutcome {
        if self.verify(submitted) {
            session.insert(AUTHED_KEY, true);
            LoginOutcome::Granted
        } else {
            session.insert(AUTHED_KEY, false);
            LoginOutcome::Denied
        }
    }

    /// Wipes every field of the session.
    pub fn logout(&self, session: &mut SessionData) {
        session.clear();
    }

    /// True only for an explicit boolean `true` marker.
    pub fn is_authenticated(session: &SessionData) -> bool {
        matches!(session.get(AUTHED_KEY), Some(Value::Bool(true)))
    }

    /// Returns the access proof for an authenticated session, `None` otherwise.
    pub fn require_authenticated(&self, session: &SessionData) -> Option<Authenticated> {
        Self::is_authenticated(session).then_some(Authenticated { _private: () })
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate").finish_non_exhaustive()
    }
}
