//! Account-wide context shared read-only by every reconciliation

use serde::{Deserialize, Serialize};

/// Identity of the account being onboarded.
///
/// Built once from the configuration document and threaded into every
/// resource's natural key. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    /// 12-digit account number
    pub account_number: String,

    /// Short account name used in stack, log group and alias names
    pub account_moniker: String,

    /// Region used for account-global clients (IAM, S3, CloudFormation)
    pub home_region: String,

    /// Credentials profile the session was built from
    pub profile: String,
}

impl AccountContext {
    pub fn new(
        account_number: impl Into<String>,
        account_moniker: impl Into<String>,
        home_region: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            account_moniker: account_moniker.into(),
            home_region: home_region.into(),
            profile: profile.into(),
        }
    }

    pub fn role_arn(&self, role_name: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account_number, role_name)
    }

    pub fn saml_provider_arn(&self, provider_name: &str) -> String {
        format!(
            "arn:aws:iam::{}:saml-provider/{}",
            self.account_number, provider_name
        )
    }

    pub fn topic_arn(&self, region: &str, topic_name: &str) -> String {
        format!(
            "arn:aws:sns:{}:{}:{}",
            region, self.account_number, topic_name
        )
    }

    /// `<moniker>-<suffix>`, the naming scheme for stacks and log groups
    pub fn monikered(&self, suffix: &str) -> String {
        format!("{}-{}", self.account_moniker, suffix)
    }
}

/// Enabled regions, in the order the provider returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<String>,
}

impl RegionSet {
    pub fn new(regions: Vec<String>) -> Self {
        Self { regions }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RegionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
