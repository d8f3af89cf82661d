use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use super::{ObjectEntry, ObjectStore, ObjectStoreError, StoredObject};

const META_SUFFIX: &str = ".meta.json";

/// Local filesystem object store for development and testing.
///
/// Keys map to paths under the base directory (a `temp/` prefix becomes a
/// subdirectory); content type and cache control live in a sidecar file
/// next to each object.
pub struct LocalStore {
    base_path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct SidecarMeta {
    content_type: String,
    cache_control: Option<String>,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Resolve a key to a path, refusing components that would escape the
    /// base directory. Keys are otherwise used verbatim.
    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(ObjectStoreError::Backend(format!(
                        "key escapes storage root: {key}"
                    )))
                }
            }
        }
        Ok(self.base_path.join(relative))
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        self.object_path(&format!("{key}{META_SUFFIX}"))
    }

    fn collect_entries(
        &self,
        dir: &Path,
        limit: usize,
        entries: &mut Vec<ObjectEntry>,
    ) -> Result<(), std::io::Error> {
        for item in std::fs::read_dir(dir)? {
            if entries.len() >= limit {
                return Ok(());
            }
            let item = item?;
            let path = item.path();
            if path.is_dir() {
                self.collect_entries(&path, limit, entries)?;
                continue;
            }
            let name = path.to_string_lossy();
            if name.ends_with(META_SUFFIX) {
                continue;
            }
            let metadata = item.metadata()?;
            let key = path
                .strip_prefix(&self.base_path)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let uploaded = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            entries.push(ObjectEntry {
                key,
                size: metadata.len(),
                uploaded,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        let meta = SidecarMeta {
            content_type: content_type.to_string(),
            cache_control: Some(cache_control.to_string()),
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        tokio::fs::write(self.meta_path(key)?, meta_json).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, ObjectStoreError> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;

        let meta = match tokio::fs::read(self.meta_path(key)?).await {
            Ok(raw) => serde_json::from_slice::<SidecarMeta>(&raw)
                .map_err(|e| ObjectStoreError::Backend(e.to_string()))?,
            Err(_) => SidecarMeta {
                content_type: "application/octet-stream".to_string(),
                cache_control: None,
            },
        };

        Ok(StoredObject {
            data: Bytes::from(data),
            content_type: meta.content_type,
            cache_control: meta.cache_control,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        let meta = self.meta_path(key)?;
        if meta.exists() {
            tokio::fs::remove_file(&meta).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(key)?;
        Ok(path.is_file())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ObjectEntry>, ObjectStoreError> {
        let mut entries = Vec::new();
        let base = self.base_path.clone();
        self.collect_entries(&base, limit, &mut entries)?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}
