//! The session cookie carrying a [`SessionToken`].

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use notewall_core::auth::SessionToken;

pub const COOKIE_NAME: &str = "notewall_session";

/// Reads the session token from the request's `Cookie` headers.
///
/// The first well-formed `notewall_session` value wins; malformed ones are
/// skipped.
pub fn read(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == COOKIE_NAME)
        .find_map(|(_, value)| SessionToken::parse(value))
}

/// `Set-Cookie` value handing `token` to the client.
pub fn issue(token: &SessionToken) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
        token.as_str()
    ))
    .ok()
}

/// `Set-Cookie` value expiring the client's token.
pub fn clear() -> HeaderValue {
    HeaderValue::from_static("notewall_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
