use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret gating uploads, deletes and listing.
    pub auth_key: String,
    pub bind_address: String,
    /// Host substituted into returned retrieval URLs when the bucket is
    /// fronted by its own public domain.
    pub public_bucket_domain: Option<String>,
    /// When set, every retrieval route answers 404 and the gateway only
    /// serves uploads/deletes.
    pub disable_retrieval: bool,
    pub render: RenderStrategy,
    /// Webhook hit after each successful anonymous upload.
    pub notify_webhook_url: Option<String>,
    /// Base URL of the image-transform backend serving /thumbnail routes.
    pub transform_proxy_url: Option<String>,
    /// Upload cap for the anonymous path, in bytes. Authenticated uploads
    /// are unbounded.
    pub anon_max_upload_size: u64,
    pub storage: StorageConfig,
    pub embed: EmbedConfig,
}

/// How a retrieval request for a stored object is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Stream the stored bytes back with Open-Graph metadata headers.
    Raw,
    /// Inline the object as a base64 data URL in a minimal HTML document.
    InlineBase64,
    /// HTML document referencing the /thumbnail/<id> URL, no inlined bytes.
    ThumbnailReference,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to ADC)
    pub gcs_credentials_file: Option<String>,
}

/// Static fields stamped into embed-metadata documents.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    pub author: String,
    pub provider: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./files".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            author: "anonymous".to_string(),
            provider: "blobgate".to_string(),
        }
    }
}

pub const DEFAULT_ANON_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let auth_key = std::env::var("AUTH_KEY").unwrap_or_default();

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let public_bucket_domain = std::env::var("PUBLIC_BUCKET_DOMAIN").ok();

        let disable_retrieval = std::env::var("DISABLE_RETRIEVAL")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let render = match std::env::var("RENDER_STRATEGY")
            .unwrap_or_else(|_| "raw".to_string())
            .to_lowercase()
            .as_str()
        {
            "inline-base64" => RenderStrategy::InlineBase64,
            "thumbnail-reference" => RenderStrategy::ThumbnailReference,
            _ => RenderStrategy::Raw,
        };

        let notify_webhook_url = std::env::var("NOTIFY_WEBHOOK_URL").ok();
        let transform_proxy_url = std::env::var("TRANSFORM_PROXY_URL").ok();

        let anon_max_upload_size = std::env::var("ANON_MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ANON_MAX_UPLOAD_SIZE);

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());

        let gcs_bucket = std::env::var("GCS_BUCKET").ok();
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();

        let embed_author =
            std::env::var("EMBED_AUTHOR").unwrap_or_else(|_| "anonymous".to_string());
        let embed_provider =
            std::env::var("EMBED_PROVIDER").unwrap_or_else(|_| "blobgate".to_string());

        let config = Config {
            auth_key,
            bind_address,
            public_bucket_domain,
            disable_retrieval,
            render,
            notify_webhook_url,
            transform_proxy_url,
            anon_max_upload_size,
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                gcs_bucket,
                gcs_credentials_file,
            },
            embed: EmbedConfig {
                author: embed_author,
                provider: embed_provider,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "AUTH_KEY cannot be empty".to_string(),
            ));
        }

        if matches!(self.storage.backend, StorageBackend::Gcs) && self.storage.gcs_bucket.is_none()
        {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when STORAGE_BACKEND=gcs".to_string(),
            ));
        }

        if self.render == RenderStrategy::ThumbnailReference && self.transform_proxy_url.is_none()
        {
            return Err(ConfigError::ValidationError(
                "TRANSFORM_PROXY_URL is required when RENDER_STRATEGY=thumbnail-reference"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            auth_key: "secret".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            public_bucket_domain: None,
            disable_retrieval: false,
            render: RenderStrategy::Raw,
            notify_webhook_url: None,
            transform_proxy_url: None,
            anon_max_upload_size: DEFAULT_ANON_MAX_UPLOAD_SIZE,
            storage: StorageConfig::default(),
            embed: EmbedConfig::default(),
        }
    }

    #[test]
    fn validate_rejects_empty_auth_key() {
        let mut config = base_config();
        config.auth_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_gcs_bucket_for_gcs_backend() {
        let mut config = base_config();
        config.storage.backend = StorageBackend::Gcs;
        assert!(config.validate().is_err());

        config.storage.gcs_bucket = Some("bucket".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_proxy_for_thumbnail_reference() {
        let mut config = base_config();
        config.render = RenderStrategy::ThumbnailReference;
        assert!(config.validate().is_err());

        config.transform_proxy_url = Some("http://transform".to_string());
        assert!(config.validate().is_ok());
    }
}
