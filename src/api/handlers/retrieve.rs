use axum::extract::{Path, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use chrono::TimeZone;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::config::RenderStrategy;
use crate::edge_cache::CachedResponse;
use crate::keys::canonical_cache_url;
use crate::object_store::{ObjectStoreError, StoredObject};
use crate::{AppState, CACHE_CONTROL_POLICY};

// ============================================================================
// Route entry points
// ============================================================================

/// GET|HEAD /upload/<id>
pub async fn retrieve_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    retrieve(&state, &id).await
}

/// GET|HEAD /temp/*  — the wildcard re-gains its `temp/` prefix so the key
/// matches what the anonymous upload path derived.
pub async fn retrieve_temp(
    State(state): State<Arc<AppState>>,
    Path(rest): Path<String>,
) -> Result<Response, ApiError> {
    retrieve(&state, &format!("temp/{rest}")).await
}

/// GET|HEAD /*  — bare key retrieval.
pub async fn retrieve_any(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    retrieve(&state, &path).await
}

/// GET|HEAD /thumbnail/* — raw passthrough of the transform backend's
/// representation, or the embed-metadata document for a trailing `/json`.
///
/// One wildcard route: keys may contain `/` (every `temp/` key does), so a
/// single-segment pattern would never match the links the
/// thumbnail-reference strategy emits.
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if state.config.disable_retrieval {
        return Err(ApiError::not_found("Not Found"));
    }
    if let Some(key) = id.strip_suffix("/json") {
        return Ok(Json(embed_document(&state, key)).into_response());
    }

    let Some(proxy) = state.transform.as_ref() else {
        return Err(ApiError::not_found("Not Found"));
    };

    let transformed = proxy.fetch(&id, CACHE_CONTROL_POLICY).await.map_err(|e| {
        ApiError::backend(
            "Error fetching from transform proxy",
            e.name(),
            e.to_string(),
        )
    })?;

    if !transformed.is_success() {
        let status =
            StatusCode::from_u16(transformed.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ApiError::upstream(
            status,
            String::from_utf8_lossy(&transformed.body).into_owned(),
        ));
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, transformed.content_type.as_str()),
            (header::CACHE_CONTROL, CACHE_CONTROL_POLICY),
        ],
        transformed.body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct EmbedDocument {
    pub title: String,
    pub author_name: String,
    pub provider_name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: &'static str,
}

/// Discovery document for rich-link unfurling, not object data.
fn embed_document(state: &AppState, key: &str) -> EmbedDocument {
    EmbedDocument {
        title: embed_title(key),
        author_name: state.config.embed.author.clone(),
        provider_name: state.config.embed.provider.clone(),
        kind: "photo",
        version: "1.0",
    }
}

// ============================================================================
// Unified retrieval flow
// ============================================================================

/// One retrieval flow for every path shape: edge-cache lookup, object
/// fetch, render per the configured strategy, then cache fill. The
/// disabled-retrieval flag is checked before any backend call.
async fn retrieve(state: &AppState, key: &str) -> Result<Response, ApiError> {
    if state.config.disable_retrieval {
        return Err(ApiError::not_found("Not Found"));
    }
    if key.is_empty() {
        return Err(ApiError::not_found("Missing ID"));
    }

    let cache_url = canonical_cache_url(key);
    if let Some(hit) = state.edge_cache.lookup(&cache_url).await {
        tracing::debug!(key = %key, "Edge cache hit");
        return Ok(cached_to_response(hit));
    }

    let rendered = render(state, key).await?;
    state.edge_cache.store(&cache_url, rendered.clone()).await;

    Ok(cached_to_response(rendered))
}

async fn render(state: &AppState, key: &str) -> Result<CachedResponse, ApiError> {
    match state.config.render {
        RenderStrategy::Raw => {
            let object = fetch_object(state, key).await?;
            Ok(CachedResponse {
                status: 200,
                cache_control: object
                    .cache_control
                    .clone()
                    .unwrap_or_else(|| CACHE_CONTROL_POLICY.to_string()),
                extra_headers: og_metadata_headers(key),
                content_type: object.content_type,
                body: object.data,
            })
        }
        RenderStrategy::InlineBase64 => {
            let object = fetch_object(state, key).await?;
            Ok(html_response(inline_html(key, &object)))
        }
        RenderStrategy::ThumbnailReference => {
            let exists = state.store.exists(key).await.map_err(|e| {
                ApiError::backend(
                    "Error occurred reading from object storage",
                    e.name(),
                    e.to_string(),
                )
            })?;
            if !exists {
                return Err(ApiError::not_found("Not Found"));
            }
            Ok(html_response(thumbnail_html(key)))
        }
    }
}

/// Fetch the stored bytes, through the transform proxy when one is
/// deployed, directly from the blob store otherwise.
async fn fetch_object(state: &AppState, key: &str) -> Result<StoredObject, ApiError> {
    if let Some(proxy) = state.transform.as_ref() {
        let transformed = proxy.fetch(key, CACHE_CONTROL_POLICY).await.map_err(|e| {
            ApiError::backend(
                "Error fetching from transform proxy",
                e.name(),
                e.to_string(),
            )
        })?;
        if transformed.status == 404 {
            return Err(ApiError::not_found("Not Found"));
        }
        if !transformed.is_success() {
            let status =
                StatusCode::from_u16(transformed.status).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(ApiError::upstream(
                status,
                String::from_utf8_lossy(&transformed.body).into_owned(),
            ));
        }
        return Ok(StoredObject {
            data: transformed.body,
            content_type: transformed.content_type,
            cache_control: Some(CACHE_CONTROL_POLICY.to_string()),
        });
    }

    state.store.get(key).await.map_err(|e| match e {
        ObjectStoreError::NotFound(_) => ApiError::not_found("Not Found"),
        e => ApiError::backend(
            "Error occurred reading from object storage",
            e.name(),
            e.to_string(),
        ),
    })
}

// ============================================================================
// Rendering
// ============================================================================

fn cached_to_response(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = (status, cached.body).into_response();
    let headers = response.headers_mut();

    if let Ok(value) = cached.content_type.parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = cached.cache_control.parse() {
        headers.insert(header::CACHE_CONTROL, value);
    }
    for (name, value) in &cached.extra_headers {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            headers.insert(name, value);
        }
    }

    response
}

fn html_response(body: String) -> CachedResponse {
    CachedResponse {
        status: 200,
        content_type: "text/html; charset=utf-8".to_string(),
        cache_control: CACHE_CONTROL_POLICY.to_string(),
        extra_headers: Vec::new(),
        body: body.into(),
    }
}

fn og_metadata_headers(key: &str) -> Vec<(String, String)> {
    // Colons are not valid in HTTP header names, so the Open-Graph fields
    // ride on x-og-* headers.
    vec![
        ("x-og-title".to_string(), embed_title(key)),
        ("x-og-image".to_string(), format!("/{key}")),
    ]
}

/// Keys are usually Unix timestamps; format those as a human date, fall
/// back to the key itself for named slugs.
fn embed_title(key: &str) -> String {
    let slug = key.rsplit('/').next().unwrap_or(key);
    match slug.parse::<i64>().ok().and_then(|secs| {
        chrono::Utc.timestamp_opt(secs, 0).single()
    }) {
        Some(time) => format!("Uploaded {}", time.format("%a, %d %b %Y %H:%M:%S UTC")),
        None => slug.to_string(),
    }
}

fn inline_html(key: &str, object: &StoredObject) -> String {
    let title = embed_title(key);
    let data_url = format!(
        "data:{};base64,{}",
        object.content_type,
        base64::engine::general_purpose::STANDARD.encode(&object.data)
    );
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\" />\n\
         <meta property=\"og:title\" content=\"{title}\" />\n\
         <meta property=\"og:image\" content=\"/{key}\" />\n\
         <meta name=\"twitter:card\" content=\"summary_large_image\" />\n\
         <meta name=\"twitter:image\" content=\"/{key}\" />\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <img src=\"{data_url}\" alt=\"{title}\" />\n\
         </body>\n</html>\n"
    )
}

fn thumbnail_html(key: &str) -> String {
    let title = embed_title(key);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\" />\n\
         <meta property=\"og:title\" content=\"{title}\" />\n\
         <meta property=\"og:image\" content=\"/thumbnail/{key}\" />\n\
         <meta name=\"twitter:card\" content=\"summary_large_image\" />\n\
         <meta name=\"twitter:image\" content=\"/thumbnail/{key}\" />\n\
         <link rel=\"alternate\" type=\"application/json+oembed\" href=\"/thumbnail/{key}/json\" />\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <img src=\"/thumbnail/{key}\" alt=\"{title}\" />\n\
         </body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn embed_title_formats_timestamp_keys() {
        assert_eq!(
            embed_title("1719009115"),
            "Uploaded Fri, 21 Jun 2024 22:31:55 UTC"
        );
        // temp/ keys format their trailing slug
        assert_eq!(
            embed_title("temp/1719009115"),
            "Uploaded Fri, 21 Jun 2024 22:31:55 UTC"
        );
    }

    #[test]
    fn embed_title_falls_back_to_slug() {
        assert_eq!(embed_title("cat.png"), "cat.png");
        assert_eq!(embed_title("temp/cat.png"), "cat.png");
    }

    #[test]
    fn inline_html_embeds_data_url() {
        let object = StoredObject {
            data: Bytes::from_static(b"hello"),
            content_type: "text/plain".to_string(),
            cache_control: None,
        };
        let html = inline_html("greeting", &object);
        assert!(html.contains("data:text/plain;base64,aGVsbG8="));
        assert!(html.contains("og:title"));
        assert!(html.contains("twitter:card"));
    }

    #[test]
    fn thumbnail_html_references_thumbnail_routes() {
        let html = thumbnail_html("temp/42");
        assert!(html.contains("src=\"/thumbnail/temp/42\""));
        assert!(html.contains("href=\"/thumbnail/temp/42/json\""));
        assert!(!html.contains("data:"));
    }
}
