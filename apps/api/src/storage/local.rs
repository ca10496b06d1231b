use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use super::{object_key, FileStore, StorageError};

/// Stores documents under a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let candidate = Path::new(path);
        let escapes = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !candidate.starts_with(&self.root) {
            return Err(StorageError::ForeignPath(path.to_string()));
        }
        Ok(candidate.to_path_buf())
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, bytes: Bytes, suggested_name: &str) -> Result<String, StorageError> {
        let path = self.root.join(object_key(suggested_name));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StorageError> {
        let resolved = self.resolve(path)?;
        Ok(Bytes::from(tokio::fs::read(resolved).await?))
    }
}
