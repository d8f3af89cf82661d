use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blobgate::{
    api,
    clock::SystemClock,
    config::{Config, StorageBackend},
    edge_cache::MemoryCache,
    notify::{self, Notifier},
    object_store as obj,
    transform::{HttpTransformProxy, TransformProxy},
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "blobgate starting");

    // Load configuration
    let config = Config::load()?;
    if config.disable_retrieval {
        info!("Retrieval disabled; serving uploads and deletes only");
    }

    // Initialize object store backend
    let store: Arc<dyn obj::ObjectStore> = match config.storage.backend {
        StorageBackend::Local => {
            let store = obj::LocalStore::new(&config.storage.local_storage_path)?;
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            Arc::new(store)
        }
        StorageBackend::Gcs => {
            let bucket = config
                .storage
                .gcs_bucket
                .as_deref()
                .expect("GCS_BUCKET validated in config");
            let store =
                obj::GcsStore::new(bucket, config.storage.gcs_credentials_file.as_deref()).await?;
            info!("Using GCS storage backend, bucket: {}", bucket);
            Arc::new(store)
        }
    };

    // Transform proxy, when one is deployed
    let transform: Option<Arc<dyn TransformProxy>> = match config.transform_proxy_url.as_deref() {
        Some(url) => {
            info!("Using transform proxy at: {url}");
            Some(Arc::new(HttpTransformProxy::new(url)?))
        }
        None => None,
    };

    // Anonymous-upload notification channel
    let notifier: Arc<dyn Notifier> = match config.notify_webhook_url.as_deref() {
        Some(url) => {
            info!("Notifying anonymous uploads to webhook");
            Arc::new(notify::WebhookNotifier::new(url)?)
        }
        None => Arc::new(notify::NullNotifier),
    };

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        edge_cache: Arc::new(MemoryCache::new()),
        transform,
        notifier,
        clock: Arc::new(SystemClock),
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on: {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
