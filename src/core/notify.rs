//! Publish/subscribe messaging abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;

/// Identifier of a topic as issued by the messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicHandle(String);

impl TopicHandle {
    pub fn new(id: impl Into<String>) -> Self {
        TopicHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TopicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier binding one endpoint to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(String);

impl SubscriptionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        SubscriptionHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-level operations of a messaging service. One attempt per call.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn create_topic(&self, name: &str) -> Result<TopicHandle>;

    async fn subscribe(
        &self,
        topic: &TopicHandle,
        protocol: &str,
        endpoint: &str,
    ) -> Result<SubscriptionHandle>;

    async fn publish(&self, topic: &TopicHandle, message: &str, subject: &str) -> Result<()>;
}
