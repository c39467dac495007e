//! Reconcilers
//!
//! Each function inspects the provider, decides skip / create / repair and
//! issues the mutating calls. Any error other than the probe's not-found
//! signal is returned to the caller, which aborts the run.

use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::{CloudError, Result};
use crate::outcome::Outcome;
use crate::probe::{Probe, probe};
use crate::provider::{
    CreateFlowLog, CreateStack, Ec2Api, IamApi, LogsApi, PasswordPolicy, S3Api, SnsApi,
    StackApi, StackStatus, WaitConfig,
};
use crate::waiter::{await_stack_created, retry_once_if, settle};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capabilities every onboarding stack is created with
pub const STACK_CAPABILITIES: [&str; 2] = ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"];

/// Create the resource when `read` reports it missing.
///
/// For resources with no repairable attributes: existence is the whole
/// desired state.
pub async fn ensure_exists<T, R, C, CFut>(
    descriptor: &ResourceDescriptor,
    read: R,
    create: C,
) -> Result<Outcome>
where
    R: Future<Output = Result<T>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<()>>,
{
    match probe(read).await {
        Probe::Found(_) => {
            tracing::info!("Using existing {}", descriptor);
            Ok(Outcome::AlreadySatisfied)
        }
        Probe::NotFound => {
            create().await?;
            tracing::info!("Created {}", descriptor);
            Ok(Outcome::Created)
        }
        Probe::Error(e) => Err(e),
    }
}

/// Inline policy a role must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePolicy {
    pub name: String,
    pub document: String,
}

/// Desired state of an IAM role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    pub assume_role_policy: String,
    pub managed_policies: Vec<String>,
    pub inline_policies: Vec<InlinePolicy>,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, assume_role_policy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assume_role_policy: assume_role_policy.into(),
            managed_policies: Vec::new(),
            inline_policies: Vec::new(),
        }
    }

    pub fn with_managed_policy(mut self, policy_arn: impl Into<String>) -> Self {
        self.managed_policies.push(policy_arn.into());
        self
    }

    pub fn with_inline_policy(
        mut self,
        name: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        self.inline_policies.push(InlinePolicy {
            name: name.into(),
            document: document.into(),
        });
        self
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::global(ResourceKind::Role, &self.name)
    }
}

/// Bring a role into its desired state.
///
/// A missing role is created and then goes straight through the same
/// configure step an existing role gets. If configuring a role this call
/// just created hits not-found, the whole reconcile runs once more.
pub async fn reconcile_role(
    iam: &dyn IamApi,
    role: &RoleSpec,
    wait: &WaitConfig,
) -> Result<Outcome> {
    let created = AtomicBool::new(false);
    let changed = retry_once_if(CloudError::is_transient_race, wait.propagation_delay, || {
        reconcile_role_once(iam, role, &created)
    })
    .await?;

    let outcome = if created.load(Ordering::SeqCst) {
        Outcome::Created
    } else if changed {
        Outcome::Repaired
    } else {
        tracing::info!("Existing settings unchanged for role {}", role.name);
        Outcome::AlreadySatisfied
    };
    Ok(outcome)
}

async fn reconcile_role_once(
    iam: &dyn IamApi,
    role: &RoleSpec,
    created: &AtomicBool,
) -> Result<bool> {
    let race = |message: String| CloudError::TransientRace {
        resource: role.descriptor().to_string(),
        message,
    };

    let just_created = match probe(iam.get_role(&role.name)).await {
        Probe::Found(_) => {
            tracing::debug!("Using existing role {}", role.name);
            false
        }
        Probe::NotFound if created.load(Ordering::SeqCst) => {
            return Err(race("still not visible after creation".to_string()));
        }
        Probe::NotFound => {
            iam.create_role(&role.name, &role.assume_role_policy).await?;
            created.store(true, Ordering::SeqCst);
            tracing::info!("Created role {}", role.name);
            true
        }
        Probe::Error(e) => return Err(e),
    };

    match configure_role(iam, role).await {
        Err(e) if just_created && e.is_not_found() => Err(race(e.to_string())),
        other => other,
    }
}

/// Attach missing managed policies and put inline policies that are
/// missing or differ. Returns whether anything was mutated.
async fn configure_role(iam: &dyn IamApi, role: &RoleSpec) -> Result<bool> {
    let mut changed = false;

    if !role.managed_policies.is_empty() {
        let attached = iam.list_attached_role_policies(&role.name).await?;
        for policy_arn in &role.managed_policies {
            if attached.iter().any(|a| a == policy_arn) {
                continue;
            }
            iam.attach_role_policy(&role.name, policy_arn).await?;
            tracing::info!("Attached {} to role {}", policy_arn, role.name);
            changed = true;
        }
    }

    for policy in &role.inline_policies {
        let current = probe(iam.get_role_policy(&role.name, &policy.name))
            .await
            .into_result()?;
        if current
            .as_deref()
            .is_some_and(|doc| same_document(doc, &policy.document))
        {
            continue;
        }
        iam.put_role_policy(&role.name, &policy.name, &policy.document)
            .await?;
        tracing::info!("Put inline policy {} on role {}", policy.name, role.name);
        changed = true;
    }

    Ok(changed)
}

/// Policy documents are equal when they parse to the same JSON value;
/// whitespace and key order do not count.
pub fn same_document(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

pub async fn reconcile_bucket(s3: &dyn S3Api, bucket: &str, region: &str) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::global(ResourceKind::Bucket, bucket);
    ensure_exists(&descriptor, s3.head_bucket(bucket), || {
        s3.create_bucket(bucket, region)
    })
    .await
}

pub async fn reconcile_topic(
    sns: &dyn SnsApi,
    region: &str,
    topic_arn: &str,
    topic_name: &str,
) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::regional(ResourceKind::Topic, region, topic_arn);
    ensure_exists(&descriptor, sns.get_topic_attributes(topic_arn), || async {
        let arn = sns.create_topic(topic_name).await?;
        tracing::debug!("Topic ARN: {}", arn);
        Ok::<(), CloudError>(())
    })
    .await
}

pub async fn reconcile_saml_provider(
    iam: &dyn IamApi,
    provider_arn: &str,
    name: &str,
    metadata_document: &str,
) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::global(ResourceKind::SamlProvider, name);
    ensure_exists(&descriptor, iam.get_saml_provider(provider_arn), || async {
        iam.create_saml_provider(name, metadata_document).await?;
        Ok::<(), CloudError>(())
    })
    .await
}

pub async fn reconcile_account_alias(iam: &dyn IamApi, alias: &str) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::global(ResourceKind::AccountAlias, alias);
    let read = async {
        let aliases = iam.list_account_aliases().await?;
        if aliases.iter().any(|a| a == alias) {
            Ok(())
        } else {
            Err(CloudError::NotFound(descriptor.to_string()))
        }
    };
    ensure_exists(&descriptor, read, || iam.create_account_alias(alias)).await
}

/// An existing password policy is left untouched; only a missing one is set.
pub async fn reconcile_password_policy(
    iam: &dyn IamApi,
    policy: &PasswordPolicy,
) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::global(ResourceKind::PasswordPolicy, "account");
    ensure_exists(&descriptor, iam.get_password_policy(), || {
        iam.update_password_policy(policy)
    })
    .await
}

/// Ensure a log group with exactly `name` exists, waiting for a new one to
/// become usable.
pub async fn reconcile_log_group(
    logs: &dyn LogsApi,
    region: &str,
    name: &str,
    wait: &WaitConfig,
) -> Result<Outcome> {
    let descriptor = ResourceDescriptor::regional(ResourceKind::LogGroup, region, name);
    let read = async {
        let names = logs.log_group_names(name).await?;
        if names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(CloudError::NotFound(descriptor.to_string()))
        }
    };

    let outcome = ensure_exists(&descriptor, read, || logs.create_log_group(name)).await?;
    if outcome == Outcome::Created {
        settle(&descriptor.to_string(), wait.propagation_delay).await;
    }
    Ok(outcome)
}

/// Create a flow log for every VPC that has none.
///
/// Returns one outcome per VPC, in the order the provider listed them.
pub async fn reconcile_flow_logs(
    ec2: &dyn Ec2Api,
    region: &str,
    log_group_name: &str,
    deliver_logs_permission_arn: &str,
) -> Result<Vec<(ResourceDescriptor, Outcome)>> {
    let vpcs = ec2.describe_vpcs().await?;
    let flow_logs = ec2.describe_flow_logs().await?;
    let mut outcomes = Vec::with_capacity(vpcs.len());

    for vpc_id in vpcs {
        let descriptor = ResourceDescriptor::regional(ResourceKind::FlowLog, region, &vpc_id);

        if flow_logs.iter().any(|f| f.resource_id == vpc_id) {
            tracing::info!("Existing flow log unchanged for VPC {}", vpc_id);
            outcomes.push((descriptor, Outcome::AlreadySatisfied));
            continue;
        }

        ec2.create_flow_log(&CreateFlowLog {
            vpc_id: vpc_id.clone(),
            log_group_name: log_group_name.to_string(),
            deliver_logs_permission_arn: deliver_logs_permission_arn.to_string(),
        })
        .await?;
        tracing::info!("Created flow log for VPC {}", vpc_id);
        outcomes.push((descriptor, Outcome::Created));
    }

    Ok(outcomes)
}

/// Stack to create from a local template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    pub name: String,
    pub template_body: String,
}

impl StackSpec {
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::global(ResourceKind::Stack, &self.name)
    }
}

/// Create a stack unless a healthy one already exists, and wait for it.
///
/// Creation failures delete the stack automatically; the waiter reports
/// whether that cleanup succeeded.
pub async fn reconcile_stack(
    stacks: &dyn StackApi,
    spec: &StackSpec,
    wait: &WaitConfig,
) -> Result<Outcome> {
    match probe(stacks.stack_status(&spec.name)).await {
        Probe::Found(status) if status.is_healthy() => {
            tracing::info!("Using existing stack {} ({})", spec.name, status);
            Ok(Outcome::AlreadySatisfied)
        }
        Probe::Found(StackStatus::CreateInProgress) => {
            tracing::info!("Stack {} is already being created", spec.name);
            await_stack_created(stacks, &spec.name, wait).await?;
            Ok(Outcome::Created)
        }
        Probe::Found(StackStatus::DeleteComplete) | Probe::NotFound => {
            stacks
                .create_stack(&CreateStack {
                    stack_name: spec.name.clone(),
                    template_body: spec.template_body.clone(),
                    capabilities: STACK_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
                    delete_on_failure: true,
                })
                .await?;
            tracing::info!("Initiated creation of stack {}", spec.name);
            await_stack_created(stacks, &spec.name, wait).await?;
            Ok(Outcome::Created)
        }
        Probe::Found(status) => Err(CloudError::StackUnhealthy {
            stack: spec.name.clone(),
            status: status.to_string(),
        }),
        Probe::Error(e) => Err(e),
    }
}
