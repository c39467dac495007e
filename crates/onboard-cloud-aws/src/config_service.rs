//! AWS Config: recorders and delivery channels

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_config::types::{
    ConfigSnapshotDeliveryProperties, ConfigurationRecorder, DeliveryChannel,
    MaximumExecutionFrequency, RecordingGroup,
};
use onboard_cloud::{
    ConfigServiceApi, DeliveryChannelSpec, DeliveryChannelStatus, RecorderSpec, RecorderStatus,
    Result,
};

pub struct AwsConfigService {
    client: aws_sdk_config::Client,
}

impl AwsConfigService {
    pub fn new(client: aws_sdk_config::Client) -> Self {
        Self { client }
    }
}

/// The API reports `Success`/`Failure`; the readiness gate compares
/// upper-case values.
fn normalize_status(status: &str) -> String {
    status.to_ascii_uppercase()
}

#[async_trait]
impl ConfigServiceApi for AwsConfigService {
    async fn recorder_statuses(&self) -> Result<Vec<RecorderStatus>> {
        let output = self
            .client
            .describe_configuration_recorder_status()
            .send()
            .await
            .map_err(|e| {
                AwsError::from_sdk("DescribeConfigurationRecorderStatus", "recorders", e)
            })?;
        Ok(output
            .configuration_recorders_status()
            .iter()
            .map(|r| RecorderStatus {
                name: r.name().unwrap_or_default().to_string(),
                recording: r.recording(),
                last_status: r.last_status().map(|s| normalize_status(s.as_str())),
            })
            .collect())
    }

    async fn delivery_channel_statuses(&self) -> Result<Vec<DeliveryChannelStatus>> {
        let output = self
            .client
            .describe_delivery_channel_status()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeDeliveryChannelStatus", "channels", e))?;
        Ok(output
            .delivery_channels_status()
            .iter()
            .map(|c| DeliveryChannelStatus {
                name: c.name().unwrap_or_default().to_string(),
                last_status: c
                    .config_stream_delivery_info()
                    .and_then(|info| info.last_status())
                    .map(|s| normalize_status(s.as_str())),
            })
            .collect())
    }

    async fn put_recorder(&self, recorder: &RecorderSpec) -> Result<()> {
        let recording_group = RecordingGroup::builder()
            .all_supported(recorder.all_supported)
            .include_global_resource_types(recorder.include_global_resource_types)
            .build();
        let configuration = ConfigurationRecorder::builder()
            .name(&recorder.name)
            .role_arn(&recorder.role_arn)
            .recording_group(recording_group)
            .build();

        self.client
            .put_configuration_recorder()
            .configuration_recorder(configuration)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("PutConfigurationRecorder", &recorder.name, e))?;
        Ok(())
    }

    async fn put_delivery_channel(&self, channel: &DeliveryChannelSpec) -> Result<()> {
        let properties = ConfigSnapshotDeliveryProperties::builder()
            .delivery_frequency(MaximumExecutionFrequency::from(
                channel.delivery_frequency.as_str(),
            ))
            .build();
        let delivery_channel = DeliveryChannel::builder()
            .name(&channel.name)
            .s3_bucket_name(&channel.s3_bucket_name)
            .sns_topic_arn(&channel.sns_topic_arn)
            .config_snapshot_delivery_properties(properties)
            .build();

        self.client
            .put_delivery_channel()
            .delivery_channel(delivery_channel)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("PutDeliveryChannel", &channel.name, e))?;
        Ok(())
    }

    async fn start_recorder(&self, recorder_name: &str) -> Result<()> {
        self.client
            .start_configuration_recorder()
            .configuration_recorder_name(recorder_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("StartConfigurationRecorder", recorder_name, e))?;
        Ok(())
    }
}
