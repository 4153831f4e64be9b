//! Object storage abstractions

use crate::core::error::StorageError;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;
use std::str::FromStr;

/// `<scheme>://<bucket>/<key>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    scheme: String,
    bucket: String,
    key: String,
}

impl ObjectUri {
    pub fn new(scheme: &str, bucket: &str, key: &str) -> Result<Self, StorageError> {
        let uri = format!("{scheme}://{bucket}/{key}");
        let key = key.trim_start_matches('/');
        if scheme.is_empty() || bucket.is_empty() || bucket.contains('/') || key.is_empty() {
            return Err(StorageError::InvalidUri(uri));
        }
        Ok(Self {
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl FromStr for ObjectUri {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidUri(s.to_string());
        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let (bucket, key) = rest.split_once('/').ok_or_else(invalid)?;
        ObjectUri::new(scheme, bucket, key).map_err(|_| invalid())
    }
}

impl Display for ObjectUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

/// Narrow write capability of an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, uri: &ObjectUri, body: Vec<u8>, content_type: &str) -> Result<()>;
}
