//! Sequences a run: reference data, dataset, upload, notification.

use crate::builder::DatasetBuilder;
use crate::core::config::AppConfig;
use crate::core::country::CountryCodeSource;
use crate::core::error::{NotifyError, RunError};
use crate::core::notify::{MessagingClient, SubscriptionHandle, TopicHandle};
use crate::core::price::DataProvider;
use crate::core::storage::{ObjectStore, ObjectUri};
use crate::notify::Notifier;
use crate::store::StorageSink;
use indicatif::ProgressBar;
use tracing::info;

/// External services a run talks to.
pub struct Collaborators<'a> {
    pub codes: &'a dyn CountryCodeSource,
    pub provider: &'a dyn DataProvider,
    pub store: &'a dyn ObjectStore,
    pub messaging: &'a dyn MessagingClient,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub codes: usize,
    pub rows: usize,
    pub destination: ObjectUri,
    pub topic: TopicHandle,
    pub subscription: SubscriptionHandle,
}

/// Runs every stage in order, stopping at the first failure.
///
/// Nothing is uploaded or announced unless the dataset is complete. A notification failure
/// leaves the upload in place and is reported as [`RunError::Notify`].
pub async fn run_pipeline(
    config: &AppConfig,
    deps: Collaborators<'_>,
    progress: ProgressBar,
) -> Result<RunReport, RunError> {
    config.validate().map_err(RunError::Config)?;
    let destination = config.storage.destination()?;

    let table = deps.codes.country_codes().await?;
    let codes = table.codes();
    info!("Building dataset for {} codes", codes.len());

    let dataset = DatasetBuilder::new(deps.provider, config.provider.window())
        .with_concurrency(config.provider.concurrency)
        .with_merge_recovered(config.dataset.merge_recovered)
        .with_progress(progress.clone())
        .build(&codes)
        .await;
    progress.finish_and_clear();
    let dataset = dataset?;

    StorageSink::new(deps.store, config.storage.timeout())
        .upload(&dataset, &destination)
        .await?;

    let (topic, subscription) = announce(config, deps.messaging, &destination)
        .await
        .map_err(|source| RunError::Notify {
            destination: destination.clone(),
            source,
        })?;

    Ok(RunReport {
        codes: codes.len(),
        rows: dataset.len(),
        destination,
        topic,
        subscription,
    })
}

async fn announce(
    config: &AppConfig,
    messaging: &dyn MessagingClient,
    destination: &ObjectUri,
) -> Result<(TopicHandle, SubscriptionHandle), NotifyError> {
    let settings = &config.notification;
    let notifier = Notifier::new(messaging);

    let topic = notifier.create_topic(&settings.topic_name).await?;
    let subscription = notifier
        .create_subscription(
            &topic,
            &settings.protocol,
            settings.endpoint.as_deref().unwrap_or_default(),
        )
        .await?;
    notifier
        .notify_uploaded(&topic, destination, &settings.subject)
        .await?;

    Ok((topic, subscription))
}
