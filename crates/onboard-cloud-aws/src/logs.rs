//! CloudWatch Logs groups

use crate::error::AwsError;
use async_trait::async_trait;
use onboard_cloud::{LogsApi, Result};

pub struct AwsLogs {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl AwsLogs {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogsApi for AwsLogs {
    async fn log_group_names(&self, prefix: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .describe_log_groups()
            .log_group_name_prefix(prefix)
            .into_paginator()
            .send();

        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("DescribeLogGroups", prefix, e))?;
            names.extend(
                page.log_groups()
                    .iter()
                    .filter_map(|g| g.log_group_name())
                    .map(str::to_string),
            );
        }
        Ok(names)
    }

    async fn create_log_group(&self, name: &str) -> Result<()> {
        self.client
            .create_log_group()
            .log_group_name(name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateLogGroup", name, e))?;
        Ok(())
    }
}
