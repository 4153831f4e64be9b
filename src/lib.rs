pub mod app;
pub mod builder;
pub mod cli;
pub mod core;
pub mod notify;
pub mod providers;
pub mod store;

use crate::app::{Collaborators, RunReport};
use crate::core::config::{AppConfig, StorageBackend};
use crate::core::error::RunError;
use crate::core::storage::ObjectStore;
use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, info};

/// Loads configuration, wires the real services and runs the pipeline once.
pub async fn run(config_path: Option<&str>) -> Result<RunReport, RunError> {
    info!("Big Mac Index snapshot starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    }
    .map_err(RunError::Config)?;
    debug!(
        "Snapshot {} from {} to {}/{}",
        config.provider.snapshot_date,
        config.reference.location,
        config.storage.bucket,
        config.storage.key
    );

    let codes =
        providers::ReferenceFile::new(&config.reference.location, config.provider.timeout());
    let provider = providers::NasdaqDataLinkProvider::new(&config.provider)
        .context("Failed to create data provider")
        .map_err(RunError::Config)?;

    let sdk_config = load_aws_config(&config).await;
    let store: Box<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::S3 => Box::new(store::S3ObjectStore::new(
            &sdk_config,
            config.aws.endpoint_url.is_some(),
        )),
        StorageBackend::Disk => {
            let root = config
                .storage
                .root
                .as_deref()
                .context("storage.root is required for the disk backend")
                .map_err(RunError::Config)?;
            Box::new(store::DiskObjectStore::new(root))
        }
    };
    let messaging = notify::SnsMessagingClient::new(&sdk_config);

    app::run_pipeline(
        &config,
        Collaborators {
            codes: &codes,
            provider: &provider,
            store: store.as_ref(),
            messaging: &messaging,
        },
        cli::ui::new_progress_bar(),
    )
    .await
}

async fn load_aws_config(config: &AppConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint_url) = &config.aws.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    loader.load().await
}
