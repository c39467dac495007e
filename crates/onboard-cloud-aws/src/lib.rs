//! AWS provider for onboard
//!
//! This crate implements the `CloudProvider` trait on top of the AWS SDK,
//! so the reconcilers in `onboard-cloud` can bootstrap a real account.
//!
//! # Services
//!
//! - CloudFormation (audit / VPC stacks)
//! - IAM (roles, SAML provider, alias, password policy)
//! - EC2 (regions, flow logs, network ACLs)
//! - AWS Config, SNS, CloudWatch Logs, S3
//!
//! # Requirements
//!
//! - Credentials for the target account in a named profile of the shared
//!   AWS config files (`~/.aws/config`, `~/.aws/credentials`)
//!
//! # Example
//!
//! ```ignore
//! use onboard_cloud_aws::AwsProvider;
//! use onboard_cloud::CloudProvider;
//!
//! let provider = AwsProvider::load("acme-admin", "us-east-1").await;
//! let regions = provider.ec2(provider.home_region()).describe_regions().await?;
//! ```

pub mod config_service;
pub mod ec2;
pub mod error;
pub mod iam;
pub mod logs;
pub mod provider;
pub mod s3;
pub mod sns;
pub mod stacks;

pub use error::AwsError;
pub use provider::AwsProvider;
