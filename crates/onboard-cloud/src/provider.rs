//! Provider client facade
//!
//! One capability-scoped trait per provider service. Account-global services
//! are bound to the home region; regional ones are handed out per region by
//! [`CloudProvider`].
//!
//! Every read call reports a missing resource as
//! [`CloudError::NotFound`](crate::CloudError::NotFound) and every mutating
//! call returns `Err` when the provider did not accept it, so callers never
//! need to inspect a response for a success flag.

use crate::error::Result;
use crate::nacl::NaclRule;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Factory for service clients
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws")
    fn name(&self) -> &str;

    fn iam(&self) -> Arc<dyn IamApi>;

    fn s3(&self) -> Arc<dyn S3Api>;

    fn stacks(&self) -> Arc<dyn StackApi>;

    fn ec2(&self, region: &str) -> Arc<dyn Ec2Api>;

    fn config_service(&self, region: &str) -> Arc<dyn ConfigServiceApi>;

    fn sns(&self, region: &str) -> Arc<dyn SnsApi>;

    fn logs(&self, region: &str) -> Arc<dyn LogsApi>;
}

/// Stack orchestration
#[async_trait]
pub trait StackApi: Send + Sync {
    async fn create_stack(&self, request: &CreateStack) -> Result<()>;

    /// Current status; `NotFound` once the stack is gone
    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus>;
}

/// Identity management (account-global)
#[async_trait]
pub trait IamApi: Send + Sync {
    async fn get_role(&self, role_name: &str) -> Result<RoleInfo>;

    async fn create_role(&self, role_name: &str, assume_role_policy: &str) -> Result<RoleInfo>;

    /// ARNs of the managed policies attached to a role
    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<String>>;

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;

    /// Decoded inline policy document
    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String>;

    async fn put_role_policy(&self, role_name: &str, policy_name: &str, document: &str)
    -> Result<()>;

    async fn get_saml_provider(&self, arn: &str) -> Result<()>;

    /// Returns the new provider's ARN
    async fn create_saml_provider(&self, name: &str, metadata_document: &str) -> Result<String>;

    async fn list_account_aliases(&self) -> Result<Vec<String>>;

    async fn create_account_alias(&self, alias: &str) -> Result<()>;

    async fn get_password_policy(&self) -> Result<PasswordPolicy>;

    async fn update_password_policy(&self, policy: &PasswordPolicy) -> Result<()>;
}

/// Virtual network management (regional)
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Enabled regions, in provider order
    async fn describe_regions(&self) -> Result<Vec<String>>;

    /// VPC ids
    async fn describe_vpcs(&self) -> Result<Vec<String>>;

    async fn describe_flow_logs(&self) -> Result<Vec<FlowLogInfo>>;

    async fn create_flow_log(&self, request: &CreateFlowLog) -> Result<()>;

    async fn describe_network_acls(&self) -> Result<Vec<NetworkAcl>>;

    async fn delete_network_acl_entry(
        &self,
        network_acl_id: &str,
        rule_number: i32,
        egress: bool,
    ) -> Result<()>;

    async fn create_network_acl_entry(&self, network_acl_id: &str, rule: &NaclRule) -> Result<()>;
}

/// Config-recording management (regional)
#[async_trait]
pub trait ConfigServiceApi: Send + Sync {
    async fn recorder_statuses(&self) -> Result<Vec<RecorderStatus>>;

    async fn delivery_channel_statuses(&self) -> Result<Vec<DeliveryChannelStatus>>;

    async fn put_recorder(&self, recorder: &RecorderSpec) -> Result<()>;

    async fn put_delivery_channel(&self, channel: &DeliveryChannelSpec) -> Result<()>;

    async fn start_recorder(&self, recorder_name: &str) -> Result<()>;
}

/// Topic / notification management (regional)
#[async_trait]
pub trait SnsApi: Send + Sync {
    async fn get_topic_attributes(&self, topic_arn: &str) -> Result<()>;

    /// Returns the topic ARN
    async fn create_topic(&self, name: &str) -> Result<String>;
}

/// Log management (regional)
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// Names of the log groups starting with `prefix`
    async fn log_group_names(&self, prefix: &str) -> Result<Vec<String>>;

    async fn create_log_group(&self, name: &str) -> Result<()>;
}

/// Object storage (account-global)
#[async_trait]
pub trait S3Api: Send + Sync {
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()>;
}

/// Stack creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStack {
    pub stack_name: String,
    pub template_body: String,
    pub capabilities: Vec<String>,
    /// Delete the stack automatically when creation fails
    pub delete_on_failure: bool,
}

/// CloudFormation stack status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackStatus {
    CreateInProgress,
    CreateComplete,
    CreateFailed,
    RollbackInProgress,
    RollbackComplete,
    RollbackFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    Other(String),
}

impl StackStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "CREATE_COMPLETE" => Self::CreateComplete,
            "CREATE_FAILED" => Self::CreateFailed,
            "ROLLBACK_IN_PROGRESS" => Self::RollbackInProgress,
            "ROLLBACK_COMPLETE" => Self::RollbackComplete,
            "ROLLBACK_FAILED" => Self::RollbackFailed,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_COMPLETE" => Self::DeleteComplete,
            "DELETE_FAILED" => Self::DeleteFailed,
            other => Self::Other(other.to_string()),
        }
    }

    /// A stack that exists and serves its template
    pub fn is_healthy(&self) -> bool {
        match self {
            Self::CreateComplete => true,
            Self::Other(s) => matches!(
                s.as_str(),
                "UPDATE_COMPLETE" | "UPDATE_ROLLBACK_COMPLETE" | "IMPORT_COMPLETE"
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::CreateFailed => "CREATE_FAILED",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::Other(s) => s,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub name: String,
    pub arn: String,
}

/// Account password policy.
///
/// Field names follow the provider API so the configuration document can
/// be passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_password_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_symbols: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_numbers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_uppercase_characters: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_lowercase_characters: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_users_to_change_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_password_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reuse_prevention: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_expiry: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLogInfo {
    pub flow_log_id: String,
    pub resource_id: String,
}

/// Flow log for one VPC, all traffic, delivered to a log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFlowLog {
    pub vpc_id: String,
    pub log_group_name: String,
    pub deliver_logs_permission_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAcl {
    pub network_acl_id: String,
    pub is_default: bool,
    pub entries: Vec<NaclRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderStatus {
    pub name: String,
    pub recording: bool,
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryChannelStatus {
    pub name: String,
    pub last_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSpec {
    pub name: String,
    pub role_arn: String,
    pub all_supported: bool,
    pub include_global_resource_types: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryChannelSpec {
    pub name: String,
    pub s3_bucket_name: String,
    pub sns_topic_arn: String,
    pub delivery_frequency: String,
}

/// Polling and propagation settings for the convergence waiter
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Maximum number of status polls
    pub max_attempts: u32,

    /// Delay before the second poll
    pub initial_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,

    /// Fixed wait standing in for eventual consistency (IAM roles, log groups)
    pub propagation_delay: Duration,
}

impl WaitConfig {
    /// No sleeping at all; for tests and dry providers
    pub fn immediate() -> Self {
        Self {
            max_attempts: 20,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            propagation_delay: Duration::ZERO,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 1.5,
            propagation_delay: Duration::from_secs(30),
        }
    }
}
