//! Server-side session data and client-held tokens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Session key carrying the authentication marker.
pub const AUTHED_KEY: &str = "authed";

const MAX_TOKEN_LEN: usize = 128;

/// Opaque token a client presents to find its session.
///
/// Deliberately has no `Display` impl so it does not end up in log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mints a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts a client-supplied token if it looks like one we could have minted.
    ///
    /// Anything else is treated as "no token" by callers, which starts a fresh
    /// session.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty()
            || raw.len() > MAX_TOKEN_LEN
            || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key/value bag stored per session.
///
/// Kept as untyped JSON so that a value of the wrong shape (a string where a
/// boolean belongs, say) is representable and can be rejected on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    values: Map<String, Value>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Drops every field.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_parseable() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(SessionToken::parse(a.as_str()), Some(a));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SessionToken::parse("").is_none());
        assert!(SessionToken::parse("abc;def").is_none());
        assert!(SessionToken::parse("../etc/passwd").is_none());
        assert!(SessionToken::parse(&"a".repeat(MAX_TOKEN_LEN + 1)).is_none());
    }

    #[test]
    fn test_session_data_clear() {
        let mut data = SessionData::new();
        data.insert(AUTHED_KEY, true);
        data.insert("flash", "hello");
        assert_eq!(data.len(), 2);

        data.clear();
        assert!(data.is_empty());
        assert!(data.get(AUTHED_KEY).is_none());
    }
}
