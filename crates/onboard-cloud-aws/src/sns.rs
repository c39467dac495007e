//! SNS topics

use crate::error::AwsError;
use async_trait::async_trait;
use onboard_cloud::{Result, SnsApi};

pub struct AwsSns {
    client: aws_sdk_sns::Client,
}

impl AwsSns {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SnsApi for AwsSns {
    async fn get_topic_attributes(&self, topic_arn: &str) -> Result<()> {
        self.client
            .get_topic_attributes()
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetTopicAttributes", topic_arn, e))?;
        Ok(())
    }

    async fn create_topic(&self, name: &str) -> Result<String> {
        let output = self
            .client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateTopic", name, e))?;
        let arn = output.topic_arn().ok_or(AwsError::MissingField {
            operation: "CreateTopic",
            field: "TopicArn",
        })?;
        Ok(arn.to_string())
    }
}
