use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

// ============================================================================
// Response envelopes
// ============================================================================

/// Bare `{"success":true}` ack (deletion).
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Json<Ack> {
        Json(Ack { success: true })
    }
}

/// Successful upload: retrieval URL plus self-describing deletion URL.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub image: String,
    #[serde(rename = "deleteUrl")]
    pub delete_url: String,
}

/// Identity of a failed backend call, nested in 500 envelopes.
#[derive(Debug, Serialize)]
pub struct BackendErrorBody {
    pub name: String,
    pub message: String,
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Everything a handler can answer besides its success envelope.
///
/// All variants render the `success:false` JSON convention except
/// `Upstream`, which relays a transform-proxy status verbatim with a
/// plain-text body.
#[derive(Debug)]
pub enum ApiError {
    /// 400 — request is malformed; nothing was attempted against a backend.
    Client(String),
    /// 401 — credential missing or mismatched; short-circuits the handler.
    Auth,
    /// 404 — absent id, unmatched route, or retrieval globally disabled.
    NotFound(String),
    /// 500 — single-attempt backend call failed; carries its identity.
    Backend {
        message: String,
        name: String,
        detail: String,
    },
    /// Non-success status from the transform proxy, propagated as-is.
    Upstream(StatusCode, String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Client(message.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Auth
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn backend(
        message: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        ApiError::Backend {
            message: message.into(),
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn upstream(status: StatusCode, body: impl Into<String>) -> Self {
        ApiError::Upstream(status, body.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Client(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "success": false,
                    "message": message,
                })),
            )
                .into_response(),
            ApiError::Auth => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Missing auth",
                })),
            )
                .into_response(),
            ApiError::NotFound(error) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "success": false,
                    "error": error,
                })),
            )
                .into_response(),
            ApiError::Backend {
                message,
                name,
                detail,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": message,
                    "error": BackendErrorBody {
                        name,
                        message: detail,
                    },
                })),
            )
                .into_response(),
            ApiError::Upstream(status, body) => (
                status,
                [(axum::http::header::CONTENT_TYPE, "text/plain")],
                body,
            )
                .into_response(),
        }
    }
}

// ============================================================================
// Custom extractors
// ============================================================================

/// Drop-in replacement for `axum::extract::Query` that rejects with the
/// gateway's envelope and tolerates stray parameters.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(format!("Invalid query parameter: {e}")))
    }
}
