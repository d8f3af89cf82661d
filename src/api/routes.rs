use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let anon_limit = state.config.anon_max_upload_size as usize;

    // Every method router carries the JSON 404 fallback so a wrong method
    // on a known path answers the same way as an unknown path.
    let not_found = handlers::not_found_fallback;

    Router::new()
        // Landing page
        .route("/", get(handlers::landing).fallback(not_found))
        // Uploads: authenticated is unbounded, anonymous is capped
        .route(
            "/upload",
            post(handlers::upload)
                .fallback(not_found)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/anonUpload",
            post(handlers::anon_upload)
                .fallback(not_found)
                .layer(DefaultBodyLimit::max(anon_limit)),
        )
        // Mutations and listing
        .route("/delete", get(handlers::delete).fallback(not_found))
        .route("/list", get(handlers::list).fallback(not_found))
        // Retrieval variants, most specific first. Thumbnails take a
        // wildcard because keys may contain slashes; the handler splits
        // off the `/json` suffix itself.
        .route("/thumbnail/*id", get(handlers::thumbnail).fallback(not_found))
        .route("/upload/:id", get(handlers::retrieve_id).fallback(not_found))
        .route("/temp/*rest", get(handlers::retrieve_temp).fallback(not_found))
        .route("/*path", get(handlers::retrieve_any).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
