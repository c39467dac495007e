//! AWS provider: shared SDK configuration, per-region service clients

use crate::config_service::AwsConfigService;
use crate::ec2::AwsEc2;
use crate::iam::AwsIam;
use crate::logs::AwsLogs;
use crate::s3::AwsS3;
use crate::sns::AwsSns;
use crate::stacks::AwsStacks;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use onboard_cloud::{
    CloudProvider, ConfigServiceApi, Ec2Api, IamApi, LogsApi, S3Api, SnsApi, StackApi,
};
use std::sync::Arc;

/// AWS provider.
///
/// Account-global clients (IAM, S3, CloudFormation) are bound to the home
/// region; regional clients are built on demand from the same credentials.
pub struct AwsProvider {
    sdk: SdkConfig,
    home_region: String,
}

impl AwsProvider {
    /// Load credentials for `profile` from the shared config files
    pub async fn load(profile: &str, home_region: &str) -> Self {
        tracing::debug!("Loading AWS profile {} ({})", profile, home_region);
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(profile)
            .region(Region::new(home_region.to_string()))
            .load()
            .await;
        Self::from_sdk_config(sdk, home_region)
    }

    pub fn from_sdk_config(sdk: SdkConfig, home_region: &str) -> Self {
        Self {
            sdk,
            home_region: home_region.to_string(),
        }
    }

    pub fn home_region(&self) -> &str {
        &self.home_region
    }

    fn region(region: &str) -> Region {
        Region::new(region.to_string())
    }
}

impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn iam(&self) -> Arc<dyn IamApi> {
        Arc::new(AwsIam::new(aws_sdk_iam::Client::new(&self.sdk)))
    }

    fn s3(&self) -> Arc<dyn S3Api> {
        Arc::new(AwsS3::new(aws_sdk_s3::Client::new(&self.sdk)))
    }

    fn stacks(&self) -> Arc<dyn StackApi> {
        Arc::new(AwsStacks::new(aws_sdk_cloudformation::Client::new(
            &self.sdk,
        )))
    }

    fn ec2(&self, region: &str) -> Arc<dyn Ec2Api> {
        let conf = aws_sdk_ec2::config::Builder::from(&self.sdk)
            .region(Self::region(region))
            .build();
        Arc::new(AwsEc2::new(aws_sdk_ec2::Client::from_conf(conf)))
    }

    fn config_service(&self, region: &str) -> Arc<dyn ConfigServiceApi> {
        let conf = aws_sdk_config::config::Builder::from(&self.sdk)
            .region(Self::region(region))
            .build();
        Arc::new(AwsConfigService::new(aws_sdk_config::Client::from_conf(
            conf,
        )))
    }

    fn sns(&self, region: &str) -> Arc<dyn SnsApi> {
        let conf = aws_sdk_sns::config::Builder::from(&self.sdk)
            .region(Self::region(region))
            .build();
        Arc::new(AwsSns::new(aws_sdk_sns::Client::from_conf(conf)))
    }

    fn logs(&self, region: &str) -> Arc<dyn LogsApi> {
        let conf = aws_sdk_cloudwatchlogs::config::Builder::from(&self.sdk)
            .region(Self::region(region))
            .build();
        Arc::new(AwsLogs::new(aws_sdk_cloudwatchlogs::Client::from_conf(
            conf,
        )))
    }
}
