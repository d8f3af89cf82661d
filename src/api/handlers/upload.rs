use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::RequestOrigin;
use crate::api::response::{ApiError, AppQuery, UploadResponse};
use crate::auth::RequireAuth;
use crate::keys::derive_key;
use crate::notify::{human_size, UploadEvent};
use crate::{AppState, CACHE_CONTROL_POLICY};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteQuery<'a> {
    filename: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    authkey: Option<&'a str>,
}

/// POST /upload — authenticated upload. Key is the supplied slug or the
/// current Unix timestamp; body size is unbounded.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
    origin: RequestOrigin,
    AppQuery(params): AppQuery<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    handle_upload(state, origin, params, headers, body, false).await
}

/// POST /anonUpload — credential-free upload, capped in size and always
/// namespaced under `temp/` so backend lifecycle rules can expire it.
pub async fn anon_upload(
    State(state): State<Arc<AppState>>,
    origin: RequestOrigin,
    AppQuery(params): AppQuery<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    handle_upload(state, origin, params, headers, body, true).await
}

async fn handle_upload(
    state: Arc<AppState>,
    origin: RequestOrigin,
    params: UploadParams,
    headers: HeaderMap,
    body: Bytes,
    anonymous: bool,
) -> Result<Json<UploadResponse>, ApiError> {
    // Both headers are mandatory; reject rather than guess.
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let content_length: Option<u64> = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let (Some(content_type), Some(content_length)) = (content_type, content_length) else {
        return Err(ApiError::bad_request(
            "content-length and content-type are required",
        ));
    };

    if anonymous && content_length > state.config.anon_max_upload_size {
        return Err(ApiError::bad_request(format!(
            "anonymous uploads are limited to {} bytes",
            state.config.anon_max_upload_size
        )));
    }

    let key = derive_key(params.filename.as_deref(), state.clock.now(), anonymous);

    // Single attempt, fail closed.
    state
        .store
        .put(&key, body.clone(), &content_type, CACHE_CONTROL_POLICY)
        .await
        .map_err(|e| {
            ApiError::backend(
                "Error occurred writing to object storage",
                e.name(),
                e.to_string(),
            )
        })?;

    let image = retrieval_url(&state, &origin, &key);
    let delete_url = deletion_url(&state, &origin, &key, anonymous)?;

    tracing::debug!(key = %key, size = body.len(), anonymous, "Stored object");

    if anonymous {
        dispatch_notification(&state, &headers, &key, &content_type, body.len() as u64, &image);
    }

    Ok(Json(UploadResponse {
        success: true,
        image,
        delete_url,
    }))
}

fn retrieval_url(state: &AppState, origin: &RequestOrigin, key: &str) -> String {
    match &state.config.public_bucket_domain {
        Some(domain) => format!("{}://{domain}/{key}", origin.scheme),
        None => format!("{}/{key}", origin.base_url()),
    }
}

/// The deletion URL is self-authorizing on the authenticated path only;
/// anonymous uploaders never see the shared secret.
fn deletion_url(
    state: &AppState,
    origin: &RequestOrigin,
    key: &str,
    anonymous: bool,
) -> Result<String, ApiError> {
    let query = DeleteQuery {
        filename: key,
        authkey: (!anonymous).then_some(state.config.auth_key.as_str()),
    };
    let query = serde_qs::to_string(&query)
        .map_err(|e| ApiError::backend("Error building deletion URL", "Serialize", e.to_string()))?;
    Ok(format!("{}/delete?{query}", origin.base_url()))
}

/// Fire-and-forget: the upload response never waits on webhook delivery,
/// and failures are only logged.
fn dispatch_notification(
    state: &AppState,
    headers: &HeaderMap,
    key: &str,
    content_type: &str,
    size: u64,
    url: &str,
) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();

    let event = UploadEvent {
        ip,
        key: key.to_string(),
        size: human_size(size),
        content_type: content_type.to_string(),
        url: url.to_string(),
    };

    let notifier = Arc::clone(&state.notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_upload(event).await {
            tracing::warn!(error = %e, "Upload notification failed");
        }
    });
}
