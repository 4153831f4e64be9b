use crate::core::notify::{MessagingClient, SubscriptionHandle, TopicHandle};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use tracing::debug;

pub struct SnsMessagingClient {
    client: aws_sdk_sns::Client,
}

impl SnsMessagingClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl MessagingClient for SnsMessagingClient {
    async fn create_topic(&self, name: &str) -> Result<TopicHandle> {
        let output = self
            .client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

        let arn = output
            .topic_arn()
            .ok_or_else(|| anyhow!("CreateTopic response carried no topic ARN"))?;
        debug!("Topic {} has ARN {}", name, arn);
        Ok(TopicHandle::new(arn))
    }

    async fn subscribe(
        &self,
        topic: &TopicHandle,
        protocol: &str,
        endpoint: &str,
    ) -> Result<SubscriptionHandle> {
        let output = self
            .client
            .subscribe()
            .topic_arn(topic.as_str())
            .protocol(protocol)
            .endpoint(endpoint)
            .return_subscription_arn(true)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;

        let arn = output
            .subscription_arn()
            .ok_or_else(|| anyhow!("Subscribe response carried no subscription ARN"))?;
        Ok(SubscriptionHandle::new(arn))
    }

    async fn publish(&self, topic: &TopicHandle, message: &str, subject: &str) -> Result<()> {
        let output = self
            .client
            .publish()
            .topic_arn(topic.as_str())
            .message(message)
            .subject(subject)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(&e)))?;
        debug!("Published message {:?} to {}", output.message_id(), topic);
        Ok(())
    }
}
