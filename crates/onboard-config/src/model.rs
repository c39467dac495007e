//! `onboard.yml` document model

use crate::error::{ConfigError, Result};
use onboard_cloud::nacl::derive_rules;
use onboard_cloud::{AccountContext, NaclEntrySpec, PasswordPolicy, WaitConfig};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Routes sent through the VPN gateway when `vpg_routed_cidrs` is not set
pub const DEFAULT_VPG_ROUTED_CIDRS: [&str; 1] = ["10.0.0.0/8"];

/// Configuration document for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardConfig {
    /// Home region (account-global clients, config bucket)
    pub region: String,
    /// Named credentials profile
    pub profile: String,
    #[serde(deserialize_with = "account_number")]
    pub account_number: String,
    pub account_moniker: String,

    pub configservice_s3_bucket_name: String,
    pub configservice_sns_topic_name: String,
    pub configservice_iam_role_name: String,

    pub flow_iam_role_name: String,

    pub shib_saml_provider: String,
    pub shib_role_name: String,
    pub shib_role_policy: String,
    pub cs_role_name: String,
    pub cs_role_policy: String,

    pub nacls: Vec<NaclEntrySpec>,
    pub iam_passwd_policy: PasswordPolicy,

    // Template generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_subnets: Vec<Subnet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_subnets: Vec<Subnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_premise_cidr: Option<String>,
    #[serde(default = "default_vpg_routed_cidrs")]
    pub vpg_routed_cidrs: Vec<String>,
    /// Sent through the VPN gateway from the private table only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vpg_private_routed_cidrs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itso_cloudtrail_bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitSettings>,
}

/// Subnet placed in availability zone `<region><az>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub az: String,
    pub cidr: String,
}

/// Overrides for the convergence waiter; unset fields keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitSettings {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_delay_secs: Option<u64>,
    #[serde(default)]
    pub max_delay_secs: Option<u64>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub propagation_delay_secs: Option<u64>,
}

impl WaitSettings {
    pub fn apply(&self, mut base: WaitConfig) -> WaitConfig {
        if let Some(n) = self.max_attempts {
            base.max_attempts = n;
        }
        if let Some(secs) = self.initial_delay_secs {
            base.initial_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_delay_secs {
            base.max_delay = Duration::from_secs(secs);
        }
        if let Some(m) = self.multiplier {
            base.backoff_multiplier = m;
        }
        if let Some(secs) = self.propagation_delay_secs {
            base.propagation_delay = Duration::from_secs(secs);
        }
        base
    }
}

fn default_vpg_routed_cidrs() -> Vec<String> {
    DEFAULT_VPG_ROUTED_CIDRS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Account numbers are often written unquoted and come back as integers
fn account_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => format!("{:012}", n),
    })
}

impl OnboardConfig {
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Apply command-line overrides for profile and home region
    pub fn with_overrides(mut self, profile: Option<String>, region: Option<String>) -> Self {
        if let Some(profile) = profile {
            self.profile = profile;
        }
        if let Some(region) = region {
            self.region = region;
        }
        self
    }

    /// Checks that do not need the provider
    pub fn validate(&self) -> Result<()> {
        if self.account_number.len() != 12
            || !self.account_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ConfigError::Invalid(format!(
                "account_number must be 12 digits, got {:?}",
                self.account_number
            )));
        }
        if self.account_moniker.trim().is_empty() {
            return Err(ConfigError::Invalid("account_moniker is empty".into()));
        }
        if self.vpn_address.is_some() && self.on_premise_cidr.is_none() {
            return Err(ConfigError::Invalid(
                "vpn_address requires on_premise_cidr".into(),
            ));
        }
        if self.vpc_cidr.is_some() && self.public_subnets.is_empty() {
            // The NAT gateway lives in the first public subnet
            return Err(ConfigError::Invalid(
                "vpc_cidr requires at least one public subnet".into(),
            ));
        }
        derive_rules(&self.nacls).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn context(&self) -> AccountContext {
        AccountContext::new(
            &self.account_number,
            &self.account_moniker,
            &self.region,
            &self.profile,
        )
    }

    /// Config bucket: `<configservice_s3_bucket_name>-<account_number>`
    pub fn config_bucket_name(&self) -> String {
        format!(
            "{}-{}",
            self.configservice_s3_bucket_name, self.account_number
        )
    }

    pub fn wait_config(&self) -> WaitConfig {
        match &self.wait {
            Some(settings) => settings.apply(WaitConfig::default()),
            None => WaitConfig::default(),
        }
    }
}
