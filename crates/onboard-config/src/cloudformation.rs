//! CloudFormation template generation
//!
//! Builds the audit and VPC templates the `stacks` command deploys. The
//! output is plain JSON; logical ids are checked for uniqueness as they are
//! added.

use crate::error::{ConfigError, Result};
use crate::model::OnboardConfig;
use crate::templates::{CLOUDTRAIL_BUCKET_POLICY, PolicyTemplates, TemplateVars};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};

const FORMAT_VERSION: &str = "2010-09-09";
const CUSTOMER_GATEWAY_ASN: &str = "65000";
const IPSEC: &str = "ipsec.1";
const ANYWHERE: &str = "0.0.0.0/0";

/// Template under construction
#[derive(Debug)]
pub struct Template {
    description: String,
    resources: Map<String, Value>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            resources: Map::new(),
        }
    }

    /// Add a resource; a logical id may only be used once
    pub fn add(&mut self, logical_id: impl Into<String>, resource: Value) -> Result<()> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(ConfigError::Invalid(format!(
                "duplicate logical id {} in template",
                logical_id
            )));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    pub fn into_json(self) -> Value {
        json!({
            "AWSTemplateFormatVersion": FORMAT_VERSION,
            "Description": self.description,
            "Resources": self.resources,
        })
    }
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn name_tag(moniker: &str, suffix: &str) -> Value {
    json!([{ "Key": "Name", "Value": format!("{}-{}", moniker, suffix) }])
}

fn resource(kind: &str, properties: Value, depends_on: &[&str]) -> Value {
    let mut resource = json!({ "Type": kind, "Properties": properties });
    if !depends_on.is_empty() {
        resource["DependsOn"] = json!(depends_on);
    }
    resource
}

/// Name of the CloudTrail bucket the audit stack creates
pub fn cloudtrail_bucket_name(moniker: &str) -> String {
    format!("{}-cloud-trail", moniker)
}

/// Auditing template: trail bucket and policy, trails, CloudTrail config rule
pub fn audit_template(config: &OnboardConfig, bucket_policy: Value) -> Result<Value> {
    let moniker = config.account_moniker.as_str();
    let bucket_name = cloudtrail_bucket_name(moniker);
    let mut t = Template::new("Standard Auditing Requirements");

    t.add(
        "cloudtrailBucket",
        resource(
            "AWS::S3::Bucket",
            json!({
                "BucketName": bucket_name,
                "Tags": name_tag(moniker, "bucket-cloudtrail"),
            }),
            &[],
        ),
    )?;
    t.add(
        "cloudtrailBucketPolicy",
        resource(
            "AWS::S3::BucketPolicy",
            json!({
                "Bucket": reference("cloudtrailBucket"),
                "PolicyDocument": bucket_policy,
            }),
            &["cloudtrailBucket"],
        ),
    )?;
    t.add(
        "cloudtrailMainTrail",
        resource(
            "AWS::CloudTrail::Trail",
            json!({
                "IncludeGlobalServiceEvents": true,
                "IsLogging": true,
                "IsMultiRegionTrail": true,
                "S3BucketName": bucket_name,
                "Tags": name_tag(moniker, "trail-main"),
            }),
            &["cloudtrailBucket", "cloudtrailBucketPolicy"],
        ),
    )?;

    match &config.itso_cloudtrail_bucket {
        Some(itso_bucket) => t.add(
            "cloudtrailItsoTrail",
            resource(
                "AWS::CloudTrail::Trail",
                json!({
                    "IncludeGlobalServiceEvents": true,
                    "IsLogging": true,
                    "IsMultiRegionTrail": true,
                    "S3BucketName": itso_bucket,
                    "Tags": name_tag(moniker, "trail-itso"),
                }),
                &[],
            ),
        )?,
        None => tracing::warn!(
            "ITSO trail not added: itso_cloudtrail_bucket is not configured"
        ),
    }

    t.add(
        "configRule",
        resource(
            "AWS::Config::ConfigRule",
            json!({
                "ConfigRuleName": "cloudtrail-enabled",
                "Description": "Checks whether AWS CloudTrail is enabled in your AWS account.",
                "Source": {
                    "Owner": "AWS",
                    "SourceIdentifier": "CLOUD_TRAIL_ENABLED",
                },
                "MaximumExecutionFrequency": "One_Hour",
            }),
            &[],
        ),
    )?;

    Ok(t.into_json())
}

/// VPC template; `None` when no `vpc_cidr` is configured
pub fn vpc_template(config: &OnboardConfig) -> Result<Option<Value>> {
    let Some(vpc_cidr) = &config.vpc_cidr else {
        return Ok(None);
    };
    if config.public_subnets.is_empty() {
        return Err(ConfigError::Invalid(
            "vpc_cidr requires at least one public subnet".into(),
        ));
    }
    let moniker = config.account_moniker.as_str();
    let mut t = Template::new(
        "A VPC environment in two availability zones with a NAT Gateway and optional VPN connection",
    );

    t.add(
        "vpc",
        resource(
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": vpc_cidr,
                "InstanceTenancy": "default",
                "EnableDnsSupport": "true",
                "Tags": name_tag(moniker, "vpc"),
            }),
            &[],
        ),
    )?;

    // Gateways
    t.add(
        "igw",
        resource(
            "AWS::EC2::InternetGateway",
            json!({ "Tags": name_tag(moniker, "igw") }),
            &[],
        ),
    )?;
    t.add(
        "gatewayAttachment",
        resource(
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "VpcId": reference("vpc"),
                "InternetGatewayId": reference("igw"),
            }),
            &["vpc", "igw"],
        ),
    )?;
    t.add(
        "vpg",
        resource(
            "AWS::EC2::VPNGateway",
            json!({ "Type": IPSEC, "Tags": name_tag(moniker, "vpg") }),
            &[],
        ),
    )?;
    t.add(
        "vpgGatewayAttachment",
        resource(
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "VpcId": reference("vpc"),
                "VpnGatewayId": reference("vpg"),
            }),
            &["vpc", "vpg"],
        ),
    )?;

    // Route tables
    t.add(
        "rtbPublic",
        resource(
            "AWS::EC2::RouteTable",
            json!({ "VpcId": reference("vpc"), "Tags": name_tag(moniker, "public-rt") }),
            &["vpc"],
        ),
    )?;
    t.add(
        "rtbPrivate",
        resource(
            "AWS::EC2::RouteTable",
            json!({ "VpcId": reference("vpc"), "Tags": name_tag(moniker, "private-rt") }),
            &["vpc"],
        ),
    )?;
    t.add(
        "routePublic",
        resource(
            "AWS::EC2::Route",
            json!({
                "GatewayId": reference("igw"),
                "DestinationCidrBlock": ANYWHERE,
                "RouteTableId": reference("rtbPublic"),
            }),
            &["gatewayAttachment", "rtbPublic"],
        ),
    )?;

    // NAT gateway in the first public subnet
    t.add(
        "eipNatGateway",
        resource("AWS::EC2::EIP", json!({ "Domain": "vpc" }), &[]),
    )?;
    t.add(
        "natGateway",
        resource(
            "AWS::EC2::NatGateway",
            json!({
                "SubnetId": reference("subnetPublic1"),
                "AllocationId": { "Fn::GetAtt": ["eipNatGateway", "AllocationId"] },
            }),
            &["subnetPublic1", "eipNatGateway"],
        ),
    )?;
    t.add(
        "routePrivate",
        resource(
            "AWS::EC2::Route",
            json!({
                "NatGatewayId": reference("natGateway"),
                "DestinationCidrBlock": ANYWHERE,
                "RouteTableId": reference("rtbPrivate"),
            }),
            &["natGateway", "rtbPrivate"],
        ),
    )?;

    for (index, cidr) in config.vpg_routed_cidrs.iter().enumerate() {
        for (table, label) in [("rtbPublic", "Public"), ("rtbPrivate", "Private")] {
            t.add(
                format!("routeVpg{}{}", label, index + 1),
                resource(
                    "AWS::EC2::Route",
                    json!({
                        "GatewayId": reference("vpg"),
                        "DestinationCidrBlock": cidr,
                        "RouteTableId": reference(table),
                    }),
                    &["vpgGatewayAttachment", table],
                ),
            )?;
        }
    }

    for (index, cidr) in config.vpg_private_routed_cidrs.iter().enumerate() {
        t.add(
            format!("routeVpgPrivateOnly{}", index + 1),
            resource(
                "AWS::EC2::Route",
                json!({
                    "GatewayId": reference("vpg"),
                    "DestinationCidrBlock": cidr,
                    "RouteTableId": reference("rtbPrivate"),
                }),
                &["vpgGatewayAttachment", "rtbPrivate"],
            ),
        )?;
    }

    add_subnets(&mut t, config, "Public", "rtbPublic", &config.public_subnets)?;
    add_subnets(&mut t, config, "Private", "rtbPrivate", &config.private_subnets)?;

    if let Some(vpn_address) = &config.vpn_address {
        let on_premise_cidr = config.on_premise_cidr.as_deref().ok_or_else(|| {
            ConfigError::Invalid("vpn_address requires on_premise_cidr".into())
        })?;

        t.add(
            "customerGateway",
            resource(
                "AWS::EC2::CustomerGateway",
                json!({
                    "BgpAsn": CUSTOMER_GATEWAY_ASN,
                    "IpAddress": vpn_address,
                    "Type": IPSEC,
                    "Tags": [
                        { "Key": "VPN", "Value": format!("Gateway to {}", vpn_address) },
                        { "Key": "Name", "Value": format!("{}-cgw", moniker) },
                    ],
                }),
                &[],
            ),
        )?;
        t.add(
            "vpnGatewayRoutePropagation",
            resource(
                "AWS::EC2::VPNGatewayRoutePropagation",
                json!({
                    "RouteTableIds": [reference("rtbPrivate"), reference("rtbPublic")],
                    "VpnGatewayId": reference("vpg"),
                }),
                &["rtbPrivate", "rtbPublic", "vpgGatewayAttachment"],
            ),
        )?;
        t.add(
            "vpnConnection",
            resource(
                "AWS::EC2::VPNConnection",
                json!({
                    "Type": IPSEC,
                    "StaticRoutesOnly": "true",
                    "CustomerGatewayId": reference("customerGateway"),
                    "VpnGatewayId": reference("vpg"),
                    "Tags": name_tag(moniker, "vpn"),
                }),
                &["customerGateway", "vpg"],
            ),
        )?;
        t.add(
            "vpnConnectionRoute",
            resource(
                "AWS::EC2::VPNConnectionRoute",
                json!({
                    "VpnConnectionId": reference("vpnConnection"),
                    "DestinationCidrBlock": on_premise_cidr,
                }),
                &["vpnConnection"],
            ),
        )?;
    }

    Ok(Some(t.into_json()))
}

fn add_subnets(
    t: &mut Template,
    config: &OnboardConfig,
    label: &str,
    route_table: &str,
    subnets: &[crate::model::Subnet],
) -> Result<()> {
    for (index, subnet) in subnets.iter().enumerate() {
        let number = index + 1;
        let subnet_id = format!("subnet{}{}", label, number);
        t.add(
            subnet_id.clone(),
            resource(
                "AWS::EC2::Subnet",
                json!({
                    "VpcId": reference("vpc"),
                    "AvailabilityZone": format!("{}{}", config.region, subnet.az),
                    "CidrBlock": subnet.cidr,
                    "Tags": [{
                        "Key": "Name",
                        "Value": format!("{}-Subnet-{}-{}", config.account_moniker, label, number),
                    }],
                }),
                &["vpc"],
            ),
        )?;
        t.add(
            format!("rtbAssociation{}{}", label, number),
            resource(
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({
                    "SubnetId": reference(&subnet_id),
                    "RouteTableId": reference(route_table),
                }),
                &[subnet_id.as_str(), route_table],
            ),
        )?;
    }
    Ok(())
}

/// Write `<moniker>-audit.json` and, when a VPC is configured,
/// `<moniker>-vpc.json` into `out_dir`. Returns the written paths.
pub fn generate(
    config: &OnboardConfig,
    templates: &PolicyTemplates,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let moniker = config.account_moniker.as_str();
    let vars = TemplateVars::new(&config.account_number, moniker)
        .with_bucket_name(cloudtrail_bucket_name(moniker));
    let bucket_policy = templates.render_json(CLOUDTRAIL_BUCKET_POLICY, &vars)?;

    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let audit = audit_template(config, bucket_policy)?;
    written.push(write_template(out_dir, &format!("{}-audit", moniker), &audit)?);

    match vpc_template(config)? {
        Some(vpc) => written.push(write_template(out_dir, &format!("{}-vpc", moniker), &vpc)?),
        None => tracing::info!("No vpc_cidr configured; VPC template skipped"),
    }

    Ok(written)
}

fn write_template(out_dir: &Path, stack_name: &str, template: &Value) -> Result<PathBuf> {
    let path = out_dir.join(format!("{}.json", stack_name));
    let body = serde_json::to_string_pretty(template).map_err(|source| ConfigError::Json {
        name: stack_name.to_string(),
        source,
    })?;
    std::fs::write(&path, body)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;

    fn resources(template: &Value) -> &Map<String, Value> {
        template["Resources"].as_object().unwrap()
    }

    #[test]
    fn test_duplicate_logical_id_rejected() {
        let mut t = Template::new("test");
        t.add("a", json!({})).unwrap();
        assert!(t.add("a", json!({})).is_err());
        assert!(t.contains("a"));
    }

    #[test]
    fn test_audit_template() {
        let policy = json!({ "Version": "2012-10-17" });
        let template = audit_template(&sample(), policy.clone()).unwrap();
        let res = resources(&template);

        assert_eq!(template["AWSTemplateFormatVersion"], FORMAT_VERSION);
        assert_eq!(res["cloudtrailBucket"]["Properties"]["BucketName"], "acme-cloud-trail");
        assert_eq!(res["cloudtrailBucketPolicy"]["Properties"]["PolicyDocument"], policy);
        assert_eq!(res["cloudtrailMainTrail"]["Properties"]["IsMultiRegionTrail"], true);
        // ITSO バケット未設定なら追加されない
        assert!(!res.contains_key("cloudtrailItsoTrail"));
        assert_eq!(
            res["configRule"]["Properties"]["Source"]["SourceIdentifier"],
            "CLOUD_TRAIL_ENABLED"
        );
    }

    #[test]
    fn test_audit_template_with_itso_trail() {
        let mut config = sample();
        config.itso_cloudtrail_bucket = Some("itso-trail-bucket".into());
        let template = audit_template(&config, json!({})).unwrap();
        assert_eq!(
            resources(&template)["cloudtrailItsoTrail"]["Properties"]["S3BucketName"],
            "itso-trail-bucket"
        );
    }

    #[test]
    fn test_vpc_template_without_cidr() {
        let mut config = sample();
        config.vpc_cidr = None;
        assert!(vpc_template(&config).unwrap().is_none());
    }

    #[test]
    fn test_vpc_template_subnets_and_routes() {
        let mut config = sample();
        config.vpg_routed_cidrs = vec!["10.0.0.0/8".into(), "128.84.0.0/16".into()];
        let template = vpc_template(&config).unwrap().unwrap();
        let res = resources(&template);

        assert_eq!(res["subnetPublic1"]["Properties"]["AvailabilityZone"], "us-east-1a");
        assert_eq!(res["subnetPublic2"]["Properties"]["CidrBlock"], "10.92.1.0/24");
        assert_eq!(res["subnetPrivate1"]["Properties"]["AvailabilityZone"], "us-east-1a");
        assert_eq!(
            res["rtbAssociationPrivate1"]["Properties"]["RouteTableId"],
            json!({ "Ref": "rtbPrivate" })
        );
        assert_eq!(
            res["routeVpgPrivate2"]["Properties"]["DestinationCidrBlock"],
            "128.84.0.0/16"
        );
        assert!(res.contains_key("routeVpgPublic1"));
        assert_eq!(
            res["natGateway"]["Properties"]["SubnetId"],
            json!({ "Ref": "subnetPublic1" })
        );
        assert!(!res.contains_key("vpnConnection"));
    }

    #[test]
    fn test_private_only_routes_stay_out_of_public_table() {
        let mut config = sample();
        config.vpg_private_routed_cidrs = vec!["128.84.0.0/16".into(), "192.35.82.0/24".into()];
        let template = vpc_template(&config).unwrap().unwrap();
        let res = resources(&template);

        let vpg_routes: Vec<(&str, &str)> = res
            .values()
            .filter(|r| {
                r["Type"] == "AWS::EC2::Route"
                    && r["Properties"]["GatewayId"] == json!({ "Ref": "vpg" })
            })
            .map(|r| {
                (
                    r["Properties"]["RouteTableId"]["Ref"].as_str().unwrap(),
                    r["Properties"]["DestinationCidrBlock"].as_str().unwrap(),
                )
            })
            .collect();
        assert_eq!(vpg_routes.len(), 4);
        assert!(vpg_routes.contains(&("rtbPublic", "10.0.0.0/8")));
        assert!(vpg_routes.contains(&("rtbPrivate", "10.0.0.0/8")));
        assert!(vpg_routes.contains(&("rtbPrivate", "128.84.0.0/16")));
        assert!(vpg_routes.contains(&("rtbPrivate", "192.35.82.0/24")));
        assert!(!vpg_routes.contains(&("rtbPublic", "128.84.0.0/16")));
        assert_eq!(
            res["routeVpgPrivateOnly2"]["Properties"]["DestinationCidrBlock"],
            "192.35.82.0/24"
        );
    }

    #[test]
    fn test_vpc_template_with_vpn() {
        let mut config = sample();
        config.vpn_address = Some("203.0.113.10".into());
        config.on_premise_cidr = Some("172.16.0.0/12".into());
        let template = vpc_template(&config).unwrap().unwrap();
        let res = resources(&template);

        assert_eq!(res["customerGateway"]["Properties"]["IpAddress"], "203.0.113.10");
        assert_eq!(
            res["vpnConnectionRoute"]["Properties"]["DestinationCidrBlock"],
            "172.16.0.0/12"
        );
    }

    #[test]
    fn test_generate_writes_files() {
        let templates_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            templates_dir.path().join(CLOUDTRAIL_BUCKET_POLICY),
            r#"{"Resource": "arn:aws:s3:::{{ bucket_name }}/AWSLogs/{{ account_number }}/*"}"#,
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();

        let written = generate(
            &sample(),
            &PolicyTemplates::new(templates_dir.path()),
            out.path(),
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert!(out.path().join("acme-audit.json").is_file());
        assert!(out.path().join("acme-vpc.json").is_file());

        let audit: Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(
            audit["Resources"]["cloudtrailBucketPolicy"]["Properties"]["PolicyDocument"]["Resource"],
            "arn:aws:s3:::acme-cloud-trail/AWSLogs/012345678901/*"
        );
    }
}
