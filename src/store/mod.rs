pub mod disk;
pub mod s3;

use crate::core::dataset::Dataset;
use crate::core::error::StorageError;
use crate::core::storage::{ObjectStore, ObjectUri};
use std::time::Duration;
use tracing::{error, info};

pub use disk::DiskObjectStore;
pub use s3::S3ObjectStore;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Serializes a dataset and writes it to an object store.
pub struct StorageSink<'a> {
    store: &'a dyn ObjectStore,
    timeout: Duration,
}

impl<'a> StorageSink<'a> {
    pub fn new(store: &'a dyn ObjectStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn upload(
        &self,
        dataset: &Dataset,
        destination: &ObjectUri,
    ) -> Result<(), StorageError> {
        let body = dataset.to_csv_bytes()?;
        let size = body.len();

        let put = self.store.put(destination, body, CSV_CONTENT_TYPE);
        match tokio::time::timeout(self.timeout, put).await {
            Ok(Ok(())) => {
                info!("Uploaded {} rows ({} bytes) to {}", dataset.len(), size, destination);
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %format!("{e:#}"), %destination, "Upload failed");
                Err(StorageError::Backend {
                    uri: destination.clone(),
                    message: format!("{e:#}"),
                })
            }
            Err(_) => {
                error!(%destination, "Upload timed out");
                Err(StorageError::Timeout {
                    uri: destination.clone(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
