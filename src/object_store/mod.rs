mod gcs;
mod local;

pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ObjectStoreError {
    /// Short identifier surfaced in backend-failure response envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectStoreError::Io(_) => "Io",
            ObjectStoreError::NotFound(_) => "NotFound",
            ObjectStoreError::Backend(_) => "Backend",
        }
    }
}

/// A stored payload with the metadata attached at write time.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub cache_control: Option<String>,
}

/// One entry of a listing call, serialized verbatim to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<String>,
}

/// Abstraction over object storage backends.
///
/// Keys are caller-derived (timestamps or verbatim client slugs, with a
/// `temp/` prefix for anonymous uploads) and may contain `/`. Writes are
/// last-write-wins; deleting a missing key is not an error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<StoredObject, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
    async fn list(&self, limit: usize) -> Result<Vec<ObjectEntry>, ObjectStoreError>;
}
