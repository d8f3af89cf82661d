use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Transform proxy error: {0}")]
    Backend(String),
}

impl TransformError {
    pub fn name(&self) -> &'static str {
        "Backend"
    }
}

/// What the transform backend answered for a key. Non-2xx statuses are
/// data, not errors, so callers can propagate them verbatim.
#[derive(Debug, Clone)]
pub struct TransformedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl TransformedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the external image-transform backend. Given an object key it
/// returns a transformed representation (e.g. a resized image) plus the
/// caching directive the edge should apply.
#[async_trait]
pub trait TransformProxy: Send + Sync {
    async fn fetch(
        &self,
        key: &str,
        cache_control: &str,
    ) -> Result<TransformedResponse, TransformError>;
}

/// HTTP implementation against a configured base URL. A single attempt, no
/// retry; transport failures surface as backend errors.
pub struct HttpTransformProxy {
    base_url: String,
    client: Client,
}

impl HttpTransformProxy {
    pub fn new(base_url: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().build()?,
        })
    }
}

#[async_trait]
impl TransformProxy for HttpTransformProxy {
    async fn fetch(
        &self,
        key: &str,
        cache_control: &str,
    ) -> Result<TransformedResponse, TransformError> {
        let resp = self
            .client
            .get(format!("{}/{key}", self.base_url))
            .header("x-cache-control", cache_control)
            .send()
            .await
            .map_err(|e| TransformError::Backend(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransformError::Backend(e.to_string()))?;

        Ok(TransformedResponse {
            status,
            content_type,
            body,
        })
    }
}
