//! EC2: regions, VPCs, flow logs, network ACLs

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_ec2::types::{
    FlowLogsResourceType, IcmpTypeCode, NetworkAclEntry, PortRange as SdkPortRange,
    RuleAction as SdkRuleAction, TrafficType,
};
use onboard_cloud::{
    CreateFlowLog, Ec2Api, FlowLogInfo, NaclRule, NetworkAcl, PortRange, Result, RuleAction,
};

/// ICMP protocol number; entries need an explicit type/code
const ICMP: &str = "1";

pub struct AwsEc2 {
    client: aws_sdk_ec2::Client,
}

impl AwsEc2 {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

fn nacl_rule(entry: &NetworkAclEntry) -> NaclRule {
    let action = match entry.rule_action() {
        Some(SdkRuleAction::Allow) => RuleAction::Allow,
        _ => RuleAction::Deny,
    };
    let port_range = entry.port_range().and_then(|p| match (p.from(), p.to()) {
        (Some(from), Some(to)) => Some(PortRange { from, to }),
        _ => None,
    });

    NaclRule {
        rule_number: entry.rule_number().unwrap_or_default(),
        protocol: entry.protocol().unwrap_or("-1").to_string(),
        action,
        egress: entry.egress().unwrap_or_default(),
        cidr_block: entry
            .cidr_block()
            .or(entry.ipv6_cidr_block())
            .unwrap_or_default()
            .to_string(),
        port_range,
    }
}

fn sdk_action(action: RuleAction) -> SdkRuleAction {
    match action {
        RuleAction::Allow => SdkRuleAction::Allow,
        RuleAction::Deny => SdkRuleAction::Deny,
    }
}

#[async_trait]
impl Ec2Api for AwsEc2 {
    async fn describe_regions(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeRegions", "account", e))?;
        Ok(output
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(str::to_string)
            .collect())
    }

    async fn describe_vpcs(&self) -> Result<Vec<String>> {
        let mut pages = self.client.describe_vpcs().into_paginator().send();
        let mut vpc_ids = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("DescribeVpcs", "vpcs", e))?;
            vpc_ids.extend(
                page.vpcs()
                    .iter()
                    .filter_map(|v| v.vpc_id())
                    .map(str::to_string),
            );
        }
        Ok(vpc_ids)
    }

    async fn describe_flow_logs(&self) -> Result<Vec<FlowLogInfo>> {
        let mut pages = self.client.describe_flow_logs().into_paginator().send();
        let mut flow_logs = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("DescribeFlowLogs", "flow logs", e))?;
            flow_logs.extend(page.flow_logs().iter().map(|f| FlowLogInfo {
                flow_log_id: f.flow_log_id().unwrap_or_default().to_string(),
                resource_id: f.resource_id().unwrap_or_default().to_string(),
            }));
        }
        Ok(flow_logs)
    }

    async fn create_flow_log(&self, request: &CreateFlowLog) -> Result<()> {
        let output = self
            .client
            .create_flow_logs()
            .resource_ids(&request.vpc_id)
            .resource_type(FlowLogsResourceType::Vpc)
            .traffic_type(TrafficType::All)
            .log_group_name(&request.log_group_name)
            .deliver_logs_permission_arn(&request.deliver_logs_permission_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateFlowLogs", &request.vpc_id, e))?;

        // The call succeeds even when individual resources were refused
        if let Some(item) = output.unsuccessful().first() {
            let message = item
                .error()
                .and_then(|e| e.message())
                .unwrap_or("unknown error");
            return Err(
                AwsError::unsuccessful("CreateFlowLogs", &request.vpc_id, message).into(),
            );
        }
        Ok(())
    }

    async fn describe_network_acls(&self) -> Result<Vec<NetworkAcl>> {
        let mut pages = self.client.describe_network_acls().into_paginator().send();
        let mut acls = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| AwsError::from_sdk("DescribeNetworkAcls", "network acls", e))?;
            acls.extend(page.network_acls().iter().map(|acl| NetworkAcl {
                network_acl_id: acl.network_acl_id().unwrap_or_default().to_string(),
                is_default: acl.is_default().unwrap_or_default(),
                entries: acl.entries().iter().map(nacl_rule).collect(),
            }));
        }
        Ok(acls)
    }

    async fn delete_network_acl_entry(
        &self,
        network_acl_id: &str,
        rule_number: i32,
        egress: bool,
    ) -> Result<()> {
        tracing::debug!(
            "Deleting {} rule {} (egress: {})",
            network_acl_id,
            rule_number,
            egress
        );
        self.client
            .delete_network_acl_entry()
            .network_acl_id(network_acl_id)
            .rule_number(rule_number)
            .egress(egress)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DeleteNetworkAclEntry", network_acl_id, e))?;
        Ok(())
    }

    async fn create_network_acl_entry(&self, network_acl_id: &str, rule: &NaclRule) -> Result<()> {
        let mut request = self
            .client
            .create_network_acl_entry()
            .network_acl_id(network_acl_id)
            .rule_number(rule.rule_number)
            .protocol(&rule.protocol)
            .rule_action(sdk_action(rule.action))
            .egress(rule.egress)
            .cidr_block(&rule.cidr_block);

        if let Some(ports) = rule.port_range {
            request = request.port_range(
                SdkPortRange::builder()
                    .from(ports.from)
                    .to(ports.to)
                    .build(),
            );
        }
        if rule.protocol == ICMP {
            request =
                request.icmp_type_code(IcmpTypeCode::builder().code(-1).r#type(-1).build());
        }

        request
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateNetworkAclEntry", network_acl_id, e))?;
        Ok(())
    }
}
