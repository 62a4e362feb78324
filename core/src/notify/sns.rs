use aws_sdk_sns::Client;
use tracing::debug;

use crate::errors::{NotificationError, Result};
use crate::notify::Notifier;

pub struct SnsNotifier {
    client: Client,
}

impl SnsNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

impl Notifier for SnsNotifier {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .publish()
            .topic_arn(topic)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| NotificationError::Publish {
                topic: topic.to_string(),
                reason: e.into_service_error().to_string(),
            })?;

        debug!("SNS message id {:?}", response.message_id());
        Ok(())
    }
}
