//! CloudFormation stacks

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_cloudformation::types::{Capability, OnFailure};
use onboard_cloud::{CloudError, CreateStack, Result, StackApi, StackStatus};

pub struct AwsStacks {
    client: aws_sdk_cloudformation::Client,
}

impl AwsStacks {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StackApi for AwsStacks {
    async fn create_stack(&self, request: &CreateStack) -> Result<()> {
        let on_failure = if request.delete_on_failure {
            OnFailure::Delete
        } else {
            OnFailure::Rollback
        };
        let capabilities = request
            .capabilities
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect();

        let output = self
            .client
            .create_stack()
            .stack_name(&request.stack_name)
            .template_body(&request.template_body)
            .set_capabilities(Some(capabilities))
            .on_failure(on_failure)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateStack", &request.stack_name, e))?;
        tracing::debug!(
            "Stack {} id: {}",
            request.stack_name,
            output.stack_id().unwrap_or("-")
        );
        Ok(())
    }

    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeStacks", stack_name, e))?;

        output
            .stacks()
            .first()
            .and_then(|s| s.stack_status())
            .map(|status| StackStatus::parse(status.as_str()))
            .ok_or_else(|| CloudError::NotFound(format!("stack {}", stack_name)))
    }
}
