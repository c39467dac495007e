//! S3 buckets

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use onboard_cloud::{Result, S3Api};

/// Region that rejects an explicit location constraint
const DEFAULT_REGION: &str = "us-east-1";

pub struct AwsS3 {
    client: aws_sdk_s3::Client,
}

impl AwsS3 {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl S3Api for AwsS3 {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("HeadBucket", bucket, e))?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateBucket", bucket, e))?;
        Ok(())
    }
}
