//! Bearer-token gate for the API.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum WebUiAuth {
    /// Require a bearer token (recommended even on localhost).
    Token(String),
    /// Generate a random ephemeral token at startup and print it once.
    DevRandom,
    /// No auth (not recommended).
    None,
}

impl WebUiAuth {
    /// Resolve to the token requests must present, if any.
    pub fn resolve_token(&self) -> Option<String> {
        match self {
            WebUiAuth::Token(t) => Some(t.clone()),
            WebUiAuth::DevRandom => {
                let token = hex::encode(rand::random::<[u8; 16]>());
                eprintln!("PROXYDECK_WEB_AUTH_TOKEN (dev): {}", token);
                Some(token)
            }
            WebUiAuth::None => None,
        }
    }
}

/// Token required by [`require_bearer`]
#[derive(Clone)]
pub struct BearerToken(pub String);

fn extract_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Middleware that rejects requests without the expected bearer token
pub async fn require_bearer(
    State(expected): State<Arc<BearerToken>>,
    request: Request,
    next: Next,
) -> Response {
    match extract_token(request.headers()) {
        Some(token) if token == expected.0 => next.run(request).await,
        Some(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid token"})),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Missing or invalid authorization header"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc"));
    }

    #[test]
    fn test_resolve_token() {
        assert_eq!(WebUiAuth::Token("t".into()).resolve_token().as_deref(), Some("t"));
        assert_eq!(WebUiAuth::None.resolve_token(), None);
        assert_eq!(WebUiAuth::DevRandom.resolve_token().map(|t| t.len()), Some(32));
    }
}
