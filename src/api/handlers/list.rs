use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::auth::RequireAuth;
use crate::object_store::ObjectEntry;
use crate::AppState;

/// Single-page listing cap; no pagination beyond it.
pub const LIST_LIMIT: usize = 1000;

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub objects: Vec<ObjectEntry>,
    pub truncated: bool,
}

/// GET /list — authenticated. Backend entries are serialized verbatim, up
/// to the single-page cap.
pub async fn list(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
) -> Result<Json<ListResponse>, ApiError> {
    let objects = state.store.list(LIST_LIMIT).await.map_err(|e| {
        ApiError::backend(
            "Error occurred listing object storage",
            e.name(),
            e.to_string(),
        )
    })?;

    let truncated = objects.len() >= LIST_LIMIT;
    Ok(Json(ListResponse {
        success: true,
        objects,
        truncated,
    }))
}
