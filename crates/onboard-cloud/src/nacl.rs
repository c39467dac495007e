//! Default network ACL lockdown
//!
//! The configured entry list replaces every user rule of each default NACL.
//! Rules are not diffed one by one: either the whole user rule set already
//! equals the desired one, or it is deleted and recreated.

use crate::error::{CloudError, Result};
use crate::outcome::Outcome;
use crate::provider::{Ec2Api, NetworkAcl};
use serde::{Deserialize, Serialize};

/// Rule number of the implicit deny-all entry. Never deleted or recreated.
pub const IMPLICIT_DENY_RULE: i32 = 32767;

/// Gap between consecutive generated rule numbers
pub const RULE_NUMBER_STEP: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub from: i32,
    pub to: i32,
}

/// One network ACL entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaclRule {
    pub rule_number: i32,
    /// Protocol number as the provider reports it (`"6"`, `"-1"`, ...)
    pub protocol: String,
    pub action: RuleAction,
    pub egress: bool,
    pub cidr_block: String,
    pub port_range: Option<PortRange>,
}

impl NaclRule {
    /// Entries below the implicit deny-all are owned by us
    pub fn is_user_rule(&self) -> bool {
        self.rule_number < IMPLICIT_DENY_RULE
    }

    /// Whether two entries enforce the same thing.
    ///
    /// Port ranges only matter for TCP and UDP; the provider drops them for
    /// other protocols.
    pub fn matches(&self, other: &NaclRule) -> bool {
        let protocol = normalize_protocol(&self.protocol);
        self.rule_number == other.rule_number
            && self.egress == other.egress
            && self.action == other.action
            && self.cidr_block == other.cidr_block
            && protocol == normalize_protocol(&other.protocol)
            && (!uses_ports(&protocol) || self.port_range == other.port_range)
    }
}

/// Protocol as written in the configuration document: a number or a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProtocolSpec {
    Number(i64),
    Name(String),
}

impl std::fmt::Display for ProtocolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolSpec::Number(n) => write!(f, "{}", n),
            ProtocolSpec::Name(name) => f.write_str(name),
        }
    }
}

/// Configured entry: `{protocol, rule, cidr, from, to}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaclEntrySpec {
    pub protocol: ProtocolSpec,
    pub rule: RuleAction,
    pub cidr: String,
    #[serde(default)]
    pub from: Option<i32>,
    #[serde(default)]
    pub to: Option<i32>,
}

/// Map protocol names to the numbers the provider reports
pub fn normalize_protocol(protocol: &str) -> String {
    match protocol.trim().to_ascii_lowercase().as_str() {
        "tcp" => "6".to_string(),
        "udp" => "17".to_string(),
        "icmp" => "1".to_string(),
        "all" | "-1" => "-1".to_string(),
        other => other.to_string(),
    }
}

fn uses_ports(protocol: &str) -> bool {
    matches!(protocol, "6" | "17")
}

/// Expand configured entries into rules.
///
/// Entry `i` gets rule number `100 * (i + 1)` and produces one egress and
/// one ingress rule.
pub fn derive_rules(entries: &[NaclEntrySpec]) -> Result<Vec<NaclRule>> {
    let mut rules = Vec::with_capacity(entries.len() * 2);

    for (index, entry) in entries.iter().enumerate() {
        let rule_number = (index as i32 + 1) * RULE_NUMBER_STEP;
        if rule_number >= IMPLICIT_DENY_RULE {
            return Err(CloudError::InvalidConfig(format!(
                "{} NACL entries configured; rule numbers must stay below {}",
                entries.len(),
                IMPLICIT_DENY_RULE
            )));
        }

        let port_range = match (entry.from, entry.to) {
            (Some(from), Some(to)) => Some(PortRange { from, to }),
            (None, None) => None,
            _ => {
                return Err(CloudError::InvalidConfig(format!(
                    "NACL entry {} for {} needs both `from` and `to`",
                    index + 1,
                    entry.cidr
                )));
            }
        };

        let protocol = normalize_protocol(&entry.protocol.to_string());
        if uses_ports(&protocol) && port_range.is_none() {
            return Err(CloudError::InvalidConfig(format!(
                "NACL entry {} for {} is TCP/UDP and needs `from` and `to`",
                index + 1,
                entry.cidr
            )));
        }

        for egress in [true, false] {
            rules.push(NaclRule {
                rule_number,
                protocol: protocol.clone(),
                action: entry.rule,
                egress,
                cidr_block: entry.cidr.clone(),
                port_range,
            });
        }
    }

    Ok(rules)
}

/// Whether the ACL's user rules are exactly `desired`
pub fn has_rule_set(acl: &NetworkAcl, desired: &[NaclRule]) -> bool {
    let current: Vec<&NaclRule> = acl.entries.iter().filter(|e| e.is_user_rule()).collect();
    current.len() == desired.len()
        && desired
            .iter()
            .all(|want| current.iter().any(|have| have.matches(want)))
}

/// Rewrite the user rules of every default NACL visible to `ec2`
pub async fn reconcile_default_nacls(
    ec2: &dyn Ec2Api,
    region: &str,
    desired: &[NaclRule],
) -> Result<Outcome> {
    let acls = ec2.describe_network_acls().await?;
    let mut outcome = Outcome::AlreadySatisfied;
    let mut found_default = false;

    for acl in acls.iter().filter(|acl| acl.is_default) {
        found_default = true;
        outcome = outcome.merge(rewrite_acl(ec2, region, acl, desired).await?);
    }

    if !found_default {
        tracing::debug!("No default network ACL in {}", region);
    }
    Ok(outcome)
}

async fn rewrite_acl(
    ec2: &dyn Ec2Api,
    region: &str,
    acl: &NetworkAcl,
    desired: &[NaclRule],
) -> Result<Outcome> {
    if has_rule_set(acl, desired) {
        tracing::debug!("{} in {} already has the desired rules", acl.network_acl_id, region);
        return Ok(Outcome::AlreadySatisfied);
    }

    for entry in acl.entries.iter().filter(|e| e.is_user_rule()) {
        ec2.delete_network_acl_entry(&acl.network_acl_id, entry.rule_number, entry.egress)
            .await?;
    }

    for rule in desired {
        ec2.create_network_acl_entry(&acl.network_acl_id, rule).await?;
    }

    tracing::info!(
        "Rewrote {} rules of {} in {}",
        desired.len(),
        acl.network_acl_id,
        region
    );
    Ok(Outcome::Repaired)
}
