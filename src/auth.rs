use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::AppState;

pub const AUTH_HEADER: &str = "x-auth-key";
pub const AUTH_QUERY_PARAM: &str = "authkey";

#[derive(Debug, Deserialize)]
struct AuthQuery {
    authkey: Option<String>,
}

/// Coarse shared-secret check: the `x-auth-key` header is consulted first,
/// then the `authkey` query parameter. Either match authorizes. This is a
/// deliberately simple token gate, not a cryptographic protocol.
pub fn is_authorized(headers: &HeaderMap, query: &str, secret: &str) -> bool {
    if let Some(value) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        if value == secret {
            return true;
        }
    }

    match serde_qs::from_str::<AuthQuery>(query) {
        Ok(AuthQuery {
            authkey: Some(value),
        }) => value == secret,
        _ => false,
    }
}

/// Extractor gating mutating and listing routes.
///
/// Rejects with the uniform 401 envelope before the handler body runs, so
/// guarded operations never start without a valid credential.
pub struct RequireAuth;

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        if is_authorized(&parts.headers, query, &state.config.auth_key) {
            Ok(RequireAuth)
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_match_authorizes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("hunter2"));
        assert!(is_authorized(&headers, "", "hunter2"));
    }

    #[test]
    fn query_match_authorizes() {
        let headers = HeaderMap::new();
        assert!(is_authorized(&headers, "authkey=hunter2", "hunter2"));
        assert!(is_authorized(
            &headers,
            "filename=temp%2F123&authkey=hunter2",
            "hunter2"
        ));
    }

    #[test]
    fn wrong_or_missing_credential_is_rejected() {
        let mut headers = HeaderMap::new();
        assert!(!is_authorized(&headers, "", "hunter2"));
        assert!(!is_authorized(&headers, "authkey=nope", "hunter2"));

        headers.insert(AUTH_HEADER, HeaderValue::from_static("nope"));
        assert!(!is_authorized(&headers, "", "hunter2"));
    }

    #[test]
    fn bad_header_does_not_mask_query_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("stale"));
        assert!(is_authorized(&headers, "authkey=hunter2", "hunter2"));
    }
}
