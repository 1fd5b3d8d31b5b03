//! Password gate for the HTTP transport.
//!
//! Clients authenticate with either the `X-MCP-Password` header or a `pwd`
//! query parameter. A non-empty header always takes precedence over the
//! query parameter, even when it is wrong. When no password is configured
//! the server runs open and everything passes. Stdio never goes through
//! this gate; a local stdio client already owns the process.

use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub const PASSWORD_HEADER: &str = "x-mcp-password";
pub const PASSWORD_QUERY_KEY: &str = "pwd";
pub const PASSWORD_ENV_VAR: &str = "MCP_SERVER_PASSWORD";

/// Expected credential for the HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    password: Option<String>,
}

impl AuthConfig {
    /// An empty password means "no password" — open mode.
    pub fn new(password: Option<String>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
        }
    }

    /// Read the expected password from `MCP_SERVER_PASSWORD`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(PASSWORD_ENV_VAR).ok())
    }

    pub fn is_open(&self) -> bool {
        self.password.is_none()
    }

    /// Whether the supplied credential grants access.
    pub fn check(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(expected) => supplied == Some(expected.as_str()),
        }
    }
}

/// Extract the client's credential from a request.
///
/// A non-empty header value wins outright; the query parameter is only
/// consulted when the header is absent or empty.
pub fn supplied_credential(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());
    from_header.or_else(|| {
        Query::<HashMap<String, String>>::try_from_uri(uri)
            .ok()
            .and_then(|Query(params)| params.get(PASSWORD_QUERY_KEY).cloned())
            .filter(|v| !v.is_empty())
    })
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        axum::Json(serde_json::json!({
            "error": "Forbidden",
            "message": "invalid or missing password",
        })),
    )
        .into_response()
}

/// Axum middleware enforcing the password on every gated route.
pub async fn require_password(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let supplied = supplied_credential(request.headers(), request.uri());
    if auth.check(supplied.as_deref()) {
        next.run(request).await
    } else {
        forbidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(password: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(p) = password {
            headers.insert(PASSWORD_HEADER, HeaderValue::from_str(p).unwrap());
        }
        headers
    }

    #[test]
    fn open_mode_accepts_anything() {
        let auth = AuthConfig::new(None);
        assert!(auth.is_open());
        assert!(auth.check(None));
        assert!(auth.check(Some("whatever")));
    }

    #[test]
    fn empty_configured_password_means_open() {
        let auth = AuthConfig::new(Some(String::new()));
        assert!(auth.is_open());
    }

    #[test]
    fn configured_password_must_match() {
        let auth = AuthConfig::new(Some("s3cret".into()));
        assert!(auth.check(Some("s3cret")));
        assert!(!auth.check(Some("wrong")));
        assert!(!auth.check(None));
    }

    #[test]
    fn header_beats_query_even_when_wrong() {
        let headers = headers_with(Some("wrong"));
        let uri: Uri = "/mcp?pwd=s3cret".parse().unwrap();
        assert_eq!(supplied_credential(&headers, &uri).as_deref(), Some("wrong"));
    }

    #[test]
    fn empty_header_falls_back_to_query() {
        let headers = headers_with(Some(""));
        let uri: Uri = "/mcp?pwd=s3cret".parse().unwrap();
        assert_eq!(
            supplied_credential(&headers, &uri).as_deref(),
            Some("s3cret")
        );
    }

    #[test]
    fn no_credential_anywhere_is_none() {
        let headers = headers_with(None);
        let uri: Uri = "/mcp".parse().unwrap();
        assert_eq!(supplied_credential(&headers, &uri), None);
    }
}
