use crate::core::storage::{ObjectStore, ObjectUri};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Object store backed by a local directory: `<root>/<bucket>/<key>`.
pub struct DiskObjectStore {
    root: PathBuf,
}

impl DiskObjectStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn path_for(&self, uri: &ObjectUri) -> PathBuf {
        self.root.join(uri.bucket()).join(uri.key())
    }
}

#[async_trait]
impl ObjectStore for DiskObjectStore {
    async fn put(&self, uri: &ObjectUri, body: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(uri);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        debug!("Writing {} bytes to {}", body.len(), path.display());
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
