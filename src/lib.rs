//! blobgate - An ephemeral HTTP file-hosting gateway
//!
//! Clients upload a file over HTTP and receive a retrieval URL plus a
//! deletion URL. This crate provides:
//! - Swappable object storage backends (local filesystem, GCS)
//! - Authenticated and anonymous (size-capped, `temp/`-namespaced) uploads
//! - Raw, base64-inlined HTML, or thumbnail-referencing retrieval, chosen
//!   by deployment configuration
//! - A front-edge response cache that deletion invalidates

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod edge_cache;
pub mod keys;
pub mod notify;
pub mod object_store;
pub mod transform;

use std::sync::Arc;

use clock::Clock;
use config::Config;
use edge_cache::EdgeCache;
use notify::Notifier;
use object_store::ObjectStore;
use transform::TransformProxy;

/// Cache policy attached to every stored object and echoed on retrieval.
pub const CACHE_CONTROL_POLICY: &str = "public, max-age=604800";

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
    pub edge_cache: Arc<dyn EdgeCache>,
    /// Absent when no transform backend is deployed; /thumbnail routes then
    /// answer 404.
    pub transform: Option<Arc<dyn TransformProxy>>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}
