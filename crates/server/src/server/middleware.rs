//! Request-level plumbing: timeout, session token extraction, session cookie.

use std::time::Duration;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
};
use common::{protocol::SESSION_COOKIE, ServiceError};

use super::error::ApiError;

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The raw session token of an authenticated request.
///
/// Taken from the `session` cookie when one is present, otherwise from the
/// `Authorization` header (a `Bearer ` prefix is optional). Extraction only
/// checks presence; resolution happens in the service layer.
pub struct SessionToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_headers(&parts.headers)
            .map(SessionToken)
            .ok_or_else(|| ServiceError::Unauthorized("missing session token".into()).into())
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE) {
        return Some(token);
    }
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_owned())
}

/// `Set-Cookie` value carrying `token` for `max_age`.
///
/// # Errors
///
/// Fails only if `token` contains bytes not allowed in a header value.
pub fn session_cookie(token: &str, max_age: Duration) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
        max_age.as_secs()
    ))
    .map_err(|_| ServiceError::Internal("session token is not a valid header value".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn authorization_header_is_used_without_cookie() {
        let h = headers(&[(AUTHORIZATION, "abc123")]);
        assert_eq!(token_from_headers(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let h = headers(&[(AUTHORIZATION, "Bearer abc123")]);
        assert_eq!(token_from_headers(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let h = headers(&[
            (COOKIE, "theme=dark; session=from-cookie"),
            (AUTHORIZATION, "from-header"),
        ]);
        assert_eq!(token_from_headers(&h).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn unrelated_cookie_falls_back_to_header() {
        let h = headers(&[(COOKIE, "theme=dark"), (AUTHORIZATION, "from-header")]);
        assert_eq!(token_from_headers(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn missing_or_blank_token_is_none() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
        assert_eq!(token_from_headers(&headers(&[(AUTHORIZATION, "  ")])), None);
        assert_eq!(token_from_headers(&headers(&[(COOKIE, "session=")])), None);
    }

    #[test]
    fn cookie_attributes() {
        let v = session_cookie("tok", Duration::from_secs(3600)).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("session=tok;"));
        assert!(s.contains("Max-Age=3600"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Secure"));
        assert!(s.contains("SameSite=Lax"));
    }
}
