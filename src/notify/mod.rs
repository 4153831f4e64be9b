pub mod sns;

use crate::core::error::NotifyError;
use crate::core::notify::{MessagingClient, SubscriptionHandle, TopicHandle};
use crate::core::storage::ObjectUri;
use tracing::{error, info};

pub use sns::SnsMessagingClient;

/// Completion notices over a messaging service.
///
/// A run moves through `create_topic`, `create_subscription` and `publish` once each. Publishing
/// takes the [`TopicHandle`] returned by `create_topic`, so it cannot target a topic that was
/// never created. Every call is a single attempt.
pub struct Notifier<'a> {
    client: &'a dyn MessagingClient,
}

impl<'a> Notifier<'a> {
    pub fn new(client: &'a dyn MessagingClient) -> Self {
        Self { client }
    }

    pub async fn create_topic(&self, name: &str) -> Result<TopicHandle, NotifyError> {
        let topic = self.client.create_topic(name).await.map_err(|e| {
            error!(error = %format!("{e:#}"), topic = name, "Failed to create topic");
            NotifyError::CreateTopic {
                name: name.to_string(),
                message: format!("{e:#}"),
            }
        })?;
        info!("Created topic {}", topic);
        Ok(topic)
    }

    pub async fn create_subscription(
        &self,
        topic: &TopicHandle,
        protocol: &str,
        endpoint: &str,
    ) -> Result<SubscriptionHandle, NotifyError> {
        let subscription = self
            .client
            .subscribe(topic, protocol, endpoint)
            .await
            .map_err(|e| {
                error!(
                    error = %format!("{e:#}"),
                    %topic,
                    endpoint,
                    "Failed to create subscription"
                );
                NotifyError::Subscribe {
                    topic: topic.to_string(),
                    endpoint: endpoint.to_string(),
                    message: format!("{e:#}"),
                }
            })?;
        info!("Subscribed {} endpoint {} as {}", protocol, endpoint, subscription);
        Ok(subscription)
    }

    pub async fn publish(
        &self,
        topic: &TopicHandle,
        message: &str,
        subject: &str,
    ) -> Result<(), NotifyError> {
        self.client
            .publish(topic, message, subject)
            .await
            .map_err(|e| {
                error!(error = %format!("{e:#}"), %topic, "Failed to publish to topic");
                NotifyError::Publish {
                    topic: topic.to_string(),
                    message: format!("{e:#}"),
                }
            })?;
        info!("Published notification to {}", topic);
        Ok(())
    }

    /// Announces that `destination` has been written.
    pub async fn notify_uploaded(
        &self,
        topic: &TopicHandle,
        destination: &ObjectUri,
        subject: &str,
    ) -> Result<(), NotifyError> {
        self.publish(topic, &upload_message(destination), subject).await
    }
}

pub fn upload_message(destination: &ObjectUri) -> String {
    format!(
        "The file {} has been uploaded to the {} bucket ({}).",
        destination.file_name(),
        destination.bucket(),
        destination
    )
}
