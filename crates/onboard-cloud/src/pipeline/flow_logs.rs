//! VPC flow logs: delivery role, then per-region log group and flow logs

use super::Sequencer;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::Result;
use crate::reconcile::{RoleSpec, reconcile_flow_logs, reconcile_log_group, reconcile_role};
use crate::regions::for_each_region;
use crate::waiter::settle;

pub const FLOW_INLINE_POLICY: &str = "flow-policy";
pub const LOG_GROUP_SUFFIX: &str = "flowlogs";

#[derive(Debug, Clone)]
pub struct FlowLogSettings {
    pub role_name: String,
    pub assume_role_policy: String,
    pub role_policy: String,
}

impl FlowLogSettings {
    pub fn role(&self) -> RoleSpec {
        RoleSpec::new(&self.role_name, &self.assume_role_policy)
            .with_inline_policy(FLOW_INLINE_POLICY, &self.role_policy)
    }
}

pub async fn run(seq: &Sequencer<'_>, settings: &FlowLogSettings) -> Result<()> {
    let session = seq.session();
    let ctx = session.context();
    let provider = session.provider();

    let role = settings.role();
    let iam = provider.iam();
    let outcome = seq
        .step(
            role.descriptor(),
            reconcile_role(iam.as_ref(), &role, session.wait()),
        )
        .await?;
    if outcome.changed() {
        settle(&format!("role {}", role.name), session.wait().propagation_delay).await;
    }

    let role_arn = ctx.role_arn(&settings.role_name);
    let role_arn = role_arn.as_str();
    let log_group = ctx.monikered(LOG_GROUP_SUFFIX);
    let log_group = log_group.as_str();
    let regions = seq.regions().await?;

    for_each_region(regions, |region| async move {
        seq.step(
            ResourceDescriptor::regional(ResourceKind::LogGroup, &region, log_group),
            reconcile_log_group(
                provider.logs(&region).as_ref(),
                &region,
                log_group,
                session.wait(),
            ),
        )
        .await?;

        seq.steps(
            ResourceDescriptor::regional(ResourceKind::FlowLog, &region, "*"),
            reconcile_flow_logs(provider.ec2(&region).as_ref(), &region, log_group, role_arn),
        )
        .await
    })
    .await
}
