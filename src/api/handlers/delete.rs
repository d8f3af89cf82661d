use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{Ack, ApiError, AppQuery};
use crate::auth::RequireAuth;
use crate::keys::canonical_cache_url;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub filename: Option<String>,
}

/// GET /delete?filename=<key> — authenticated deletion.
///
/// The cached edge response is evicted before the blob goes away so a
/// cached copy never outlives the stored object. No existence precheck:
/// deleting an absent key succeeds if the backend does not error.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
    AppQuery(params): AppQuery<DeleteParams>,
) -> Result<Json<Ack>, ApiError> {
    let filename = params
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("filename is required"))?;

    // Best-effort: a cache miss is not an error.
    let evicted = state
        .edge_cache
        .evict(&canonical_cache_url(&filename))
        .await;
    tracing::debug!(key = %filename, evicted, "Edge cache eviction");

    state.store.delete(&filename).await.map_err(|e| {
        ApiError::backend(
            "Error occurred deleting from object storage",
            e.name(),
            e.to_string(),
        )
    })?;

    tracing::debug!(key = %filename, "Deleted object");
    Ok(Ack::ok())
}
