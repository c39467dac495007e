//! Resource identities used for logging, reporting and diagnostics

use serde::{Deserialize, Serialize};

/// Kind of resource a reconciler manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Stack,
    Role,
    SamlProvider,
    AccountAlias,
    PasswordPolicy,
    Bucket,
    Topic,
    Recorder,
    Channel,
    LogGroup,
    FlowLog,
    NaclEntrySet,
    RegionSet,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Stack => "stack",
            ResourceKind::Role => "role",
            ResourceKind::SamlProvider => "saml-provider",
            ResourceKind::AccountAlias => "account-alias",
            ResourceKind::PasswordPolicy => "password-policy",
            ResourceKind::Bucket => "bucket",
            ResourceKind::Topic => "topic",
            ResourceKind::Recorder => "recorder",
            ResourceKind::Channel => "channel",
            ResourceKind::LogGroup => "log-group",
            ResourceKind::FlowLog => "flow-log",
            ResourceKind::NaclEntrySet => "nacl-entry-set",
            ResourceKind::RegionSet => "region-set",
        };
        f.write_str(name)
    }
}

/// Whether a resource lives once per account or once per region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    Region(String),
}

/// Identity of one reconciled resource: kind, scope and natural key.
///
/// Descriptors are built per reconciliation call and thrown away; the
/// provider stays the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub key: String,
}

impl ResourceDescriptor {
    pub fn global(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            scope: Scope::Global,
            key: key.into(),
        }
    }

    pub fn regional(kind: ResourceKind, region: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind,
            scope: Scope::Region(region.into()),
            key: key.into(),
        }
    }

    pub fn region(&self) -> Option<&str> {
        match &self.scope {
            Scope::Global => None,
            Scope::Region(region) => Some(region),
        }
    }
}

impl std::fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Scope::Global => write!(f, "{} {}", self.kind, self.key),
            Scope::Region(region) => write!(f, "{} {} in {}", self.kind, self.key, region),
        }
    }
}
