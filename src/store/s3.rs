use crate::core::storage::{ObjectStore, ObjectUri};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Path-style addressing is needed by most S3 emulators behind a custom endpoint.
    pub fn new(sdk_config: &aws_config::SdkConfig, force_path_style: bool) -> Self {
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, uri: &ObjectUri, body: Vec<u8>, content_type: &str) -> Result<()> {
        if uri.scheme() != "s3" {
            bail!("S3 cannot store {uri}");
        }

        debug!("PUT {} ({} bytes)", uri, body.len());
        self.client
            .put_object()
            .bucket(uri.bucket())
            .key(uri.key())
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;
        Ok(())
    }
}
