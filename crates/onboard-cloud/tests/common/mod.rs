//! In-memory provider for reconciliation tests
//!
//! Every call is recorded with the region it was issued in, so tests can
//! assert on exactly which mutating calls a run made.

#![allow(dead_code)]

use async_trait::async_trait;
use onboard_cloud::{
    AccountContext, CloudError, CloudProvider, ConfigServiceApi, ConfigServiceSettings, Confirm,
    CreateFlowLog, CreateStack, DeliveryChannelSpec, DeliveryChannelStatus, Ec2Api,
    FlowLogInfo, FlowLogSettings, IamApi, IdentitySettings, LogsApi, NaclEntrySpec, NaclRule,
    NaclSettings, NetworkAcl, PasswordPolicy, ProtocolSpec, RecorderSpec, RecorderStatus,
    Result, RoleInfo, RuleAction, S3Api, Session, SnsApi, StackApi, StackStatus, WaitConfig,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub const ACCOUNT: &str = "123456789012";
pub const MONIKER: &str = "acme";
pub const HOME: &str = "us-east-1";

const MUTATING: [&str; 8] = [
    "create", "put", "attach", "update", "delete", "start", "stop", "detach",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub region: String,
    pub op: String,
    pub target: String,
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        MUTATING.iter().any(|m| self.op.starts_with(m))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeRole {
    pub attached: Vec<String>,
    pub inline: HashMap<String, String>,
}

#[derive(Default)]
pub struct State {
    pub regions: Vec<String>,
    pub calls: Vec<Call>,

    pub stacks: HashMap<String, StackStatus>,
    /// Statuses handed out by successive `stack_status` calls; `None` means gone
    pub stack_scripts: HashMap<String, VecDeque<Option<StackStatus>>>,

    pub roles: HashMap<String, FakeRole>,
    /// Calls touching a freshly created role that still answer not-found
    pub role_visibility_lag: u32,
    pub lagging_role: Option<String>,

    pub saml_providers: HashSet<String>,
    pub aliases: Vec<String>,
    pub password_policy: Option<PasswordPolicy>,
    pub buckets: HashSet<String>,
    pub topics: HashSet<String>,
    pub log_groups: HashMap<String, Vec<String>>,
    pub vpcs: HashMap<String, Vec<String>>,
    pub flow_logs: HashMap<String, Vec<FlowLogInfo>>,
    pub nacls: HashMap<String, Vec<NetworkAcl>>,
    pub recorders: HashMap<String, RecorderStatus>,
    pub channels: HashMap<String, DeliveryChannelStatus>,

    /// `op` or `op@region` that must fail with an API error
    pub failures: HashSet<String>,
}

impl State {
    fn record(&mut self, region: &str, op: &str, target: &str) -> Result<()> {
        self.calls.push(Call {
            region: region.to_string(),
            op: op.to_string(),
            target: target.to_string(),
        });
        if self.failures.contains(op) || self.failures.contains(&format!("{}@{}", op, region)) {
            return Err(CloudError::Api(format!("injected failure: {} {}", op, target)));
        }
        Ok(())
    }

    fn role_mut(&mut self, role_name: &str) -> Result<&mut FakeRole> {
        if self.role_visibility_lag > 0
            && self.lagging_role.as_deref() == Some(role_name)
            && self.roles.contains_key(role_name)
        {
            self.role_visibility_lag -= 1;
            return Err(CloudError::NotFound(format!("role {}", role_name)));
        }
        self.roles
            .get_mut(role_name)
            .ok_or_else(|| CloudError::NotFound(format!("role {}", role_name)))
    }
}

#[derive(Clone)]
pub struct FakeCloud {
    pub state: Arc<Mutex<State>>,
}

impl FakeCloud {
    pub fn new(regions: &[&str]) -> Self {
        let state = State {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn calls_named(&self, op: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    pub fn fail_on(&self, op: &str) {
        self.with(|s| s.failures.insert(op.to_string()));
    }

    pub fn add_vpc(&self, region: &str, vpc_id: &str) {
        self.with(|s| {
            s.vpcs
                .entry(region.to_string())
                .or_default()
                .push(vpc_id.to_string())
        });
    }

    pub fn add_default_nacl(&self, region: &str, acl_id: &str, entries: Vec<NaclRule>) {
        self.with(|s| {
            s.nacls.entry(region.to_string()).or_default().push(NetworkAcl {
                network_acl_id: acl_id.to_string(),
                is_default: true,
                entries,
            })
        });
    }

    pub fn nacl_entries(&self, region: &str, acl_id: &str) -> Vec<NaclRule> {
        self.with(|s| {
            s.nacls
                .get(region)
                .and_then(|acls| acls.iter().find(|a| a.network_acl_id == acl_id))
                .map(|a| a.entries.clone())
                .unwrap_or_default()
        })
    }

    pub fn script_stack(&self, stack: &str, statuses: Vec<Option<StackStatus>>) {
        self.with(|s| {
            s.stack_scripts
                .insert(stack.to_string(), statuses.into_iter().collect())
        });
    }

    fn client(&self, region: &str) -> Arc<FakeClient> {
        Arc::new(FakeClient {
            state: self.state.clone(),
            region: region.to_string(),
        })
    }

    pub fn session(&self) -> Session {
        Session::new(Arc::new(self.clone()), context(), WaitConfig::immediate())
    }
}

pub fn context() -> AccountContext {
    AccountContext::new(ACCOUNT, MONIKER, HOME, "default")
}

/// Implicit deny-all pair every NACL carries
pub fn implicit_deny() -> Vec<NaclRule> {
    [true, false]
        .into_iter()
        .map(|egress| NaclRule {
            rule_number: 32767,
            protocol: "-1".to_string(),
            action: RuleAction::Deny,
            egress,
            cidr_block: "0.0.0.0/0".to_string(),
            port_range: None,
        })
        .collect()
}

/// Scripted operator answers
pub struct Answers(pub Mutex<VecDeque<bool>>);

impl Answers {
    pub fn new(answers: &[bool]) -> Self {
        Self(Mutex::new(answers.iter().copied().collect()))
    }
}

impl Confirm for Answers {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(self.0.lock().unwrap().pop_front().unwrap_or(false))
    }
}

impl CloudProvider for FakeCloud {
    fn name(&self) -> &str {
        "fake"
    }

    fn iam(&self) -> Arc<dyn IamApi> {
        self.client(HOME)
    }

    fn s3(&self) -> Arc<dyn S3Api> {
        self.client(HOME)
    }

    fn stacks(&self) -> Arc<dyn StackApi> {
        self.client(HOME)
    }

    fn ec2(&self, region: &str) -> Arc<dyn Ec2Api> {
        self.client(region)
    }

    fn config_service(&self, region: &str) -> Arc<dyn ConfigServiceApi> {
        self.client(region)
    }

    fn sns(&self, region: &str) -> Arc<dyn SnsApi> {
        self.client(region)
    }

    fn logs(&self, region: &str) -> Arc<dyn LogsApi> {
        self.client(region)
    }
}

pub struct FakeClient {
    state: Arc<Mutex<State>>,
    region: String,
}

impl FakeClient {
    fn call<R>(
        &self,
        op: &str,
        target: &str,
        f: impl FnOnce(&mut State) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.region, op, target)?;
        f(&mut state)
    }
}

#[async_trait]
impl StackApi for FakeClient {
    async fn create_stack(&self, request: &CreateStack) -> Result<()> {
        self.call("create_stack", &request.stack_name, |s| {
            if !s.stack_scripts.contains_key(&request.stack_name) {
                s.stacks
                    .insert(request.stack_name.clone(), StackStatus::CreateComplete);
            }
            Ok(())
        })
    }

    async fn stack_status(&self, stack_name: &str) -> Result<StackStatus> {
        self.call("describe_stacks", stack_name, |s| {
            if let Some(next) = s.stack_scripts.get_mut(stack_name).and_then(VecDeque::pop_front) {
                match next {
                    Some(status) => {
                        s.stacks.insert(stack_name.to_string(), status);
                    }
                    None => {
                        s.stacks.remove(stack_name);
                    }
                }
            }
            s.stacks
                .get(stack_name)
                .cloned()
                .ok_or_else(|| CloudError::NotFound(format!("stack {}", stack_name)))
        })
    }
}

#[async_trait]
impl IamApi for FakeClient {
    async fn get_role(&self, role_name: &str) -> Result<RoleInfo> {
        self.call("get_role", role_name, |s| {
            s.role_mut(role_name)?;
            Ok(RoleInfo {
                name: role_name.to_string(),
                arn: format!("arn:aws:iam::{}:role/{}", ACCOUNT, role_name),
            })
        })
    }

    async fn create_role(&self, role_name: &str, _assume_role_policy: &str) -> Result<RoleInfo> {
        self.call("create_role", role_name, |s| {
            s.roles.insert(role_name.to_string(), FakeRole::default());
            Ok(RoleInfo {
                name: role_name.to_string(),
                arn: format!("arn:aws:iam::{}:role/{}", ACCOUNT, role_name),
            })
        })
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        self.call("list_attached_role_policies", role_name, |s| {
            Ok(s.role_mut(role_name)?.attached.clone())
        })
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.call("attach_role_policy", role_name, |s| {
            let role = s.role_mut(role_name)?;
            if !role.attached.iter().any(|a| a == policy_arn) {
                role.attached.push(policy_arn.to_string());
            }
            Ok(())
        })
    }

    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String> {
        self.call("get_role_policy", role_name, |s| {
            s.role_mut(role_name)?
                .inline
                .get(policy_name)
                .cloned()
                .ok_or_else(|| CloudError::NotFound(format!("policy {}", policy_name)))
        })
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &str,
    ) -> Result<()> {
        self.call("put_role_policy", role_name, |s| {
            s.role_mut(role_name)?
                .inline
                .insert(policy_name.to_string(), document.to_string());
            Ok(())
        })
    }

    async fn get_saml_provider(&self, arn: &str) -> Result<()> {
        self.call("get_saml_provider", arn, |s| {
            if s.saml_providers.contains(arn) {
                Ok(())
            } else {
                Err(CloudError::NotFound(arn.to_string()))
            }
        })
    }

    async fn create_saml_provider(&self, name: &str, _metadata_document: &str) -> Result<String> {
        self.call("create_saml_provider", name, |s| {
            let arn = format!("arn:aws:iam::{}:saml-provider/{}", ACCOUNT, name);
            s.saml_providers.insert(arn.clone());
            Ok(arn)
        })
    }

    async fn list_account_aliases(&self) -> Result<Vec<String>> {
        self.call("list_account_aliases", "account", |s| Ok(s.aliases.clone()))
    }

    async fn create_account_alias(&self, alias: &str) -> Result<()> {
        self.call("create_account_alias", alias, |s| {
            s.aliases = vec![alias.to_string()];
            Ok(())
        })
    }

    async fn get_password_policy(&self) -> Result<PasswordPolicy> {
        self.call("get_account_password_policy", "account", |s| {
            s.password_policy
                .clone()
                .ok_or_else(|| CloudError::NotFound("password policy".to_string()))
        })
    }

    async fn update_password_policy(&self, policy: &PasswordPolicy) -> Result<()> {
        self.call("update_account_password_policy", "account", |s| {
            s.password_policy = Some(policy.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl Ec2Api for FakeClient {
    async fn describe_regions(&self) -> Result<Vec<String>> {
        self.call("describe_regions", "account", |s| Ok(s.regions.clone()))
    }

    async fn describe_vpcs(&self) -> Result<Vec<String>> {
        let region = self.region.clone();
        self.call("describe_vpcs", &region, |s| {
            Ok(s.vpcs.get(&region).cloned().unwrap_or_default())
        })
    }

    async fn describe_flow_logs(&self) -> Result<Vec<FlowLogInfo>> {
        let region = self.region.clone();
        self.call("describe_flow_logs", &region, |s| {
            Ok(s.flow_logs.get(&region).cloned().unwrap_or_default())
        })
    }

    async fn create_flow_log(&self, request: &CreateFlowLog) -> Result<()> {
        let region = self.region.clone();
        self.call("create_flow_logs", &request.vpc_id, |s| {
            let flow_logs = s.flow_logs.entry(region).or_default();
            let id = format!("fl-{}", flow_logs.len() + 1);
            flow_logs.push(FlowLogInfo {
                flow_log_id: id,
                resource_id: request.vpc_id.clone(),
            });
            Ok(())
        })
    }

    async fn describe_network_acls(&self) -> Result<Vec<NetworkAcl>> {
        let region = self.region.clone();
        self.call("describe_network_acls", &region, |s| {
            Ok(s.nacls.get(&region).cloned().unwrap_or_default())
        })
    }

    async fn delete_network_acl_entry(
        &self,
        network_acl_id: &str,
        rule_number: i32,
        egress: bool,
    ) -> Result<()> {
        let region = self.region.clone();
        self.call("delete_network_acl_entry", network_acl_id, |s| {
            let acl = s
                .nacls
                .get_mut(&region)
                .and_then(|acls| acls.iter_mut().find(|a| a.network_acl_id == network_acl_id))
                .ok_or_else(|| CloudError::NotFound(network_acl_id.to_string()))?;
            let before = acl.entries.len();
            acl.entries
                .retain(|e| !(e.rule_number == rule_number && e.egress == egress));
            if acl.entries.len() == before {
                return Err(CloudError::NotFound(format!(
                    "{} rule {}",
                    network_acl_id, rule_number
                )));
            }
            Ok(())
        })
    }

    async fn create_network_acl_entry(&self, network_acl_id: &str, rule: &NaclRule) -> Result<()> {
        let region = self.region.clone();
        self.call("create_network_acl_entry", network_acl_id, |s| {
            let acl = s
                .nacls
                .get_mut(&region)
                .and_then(|acls| acls.iter_mut().find(|a| a.network_acl_id == network_acl_id))
                .ok_or_else(|| CloudError::NotFound(network_acl_id.to_string()))?;
            if acl
                .entries
                .iter()
                .any(|e| e.rule_number == rule.rule_number && e.egress == rule.egress)
            {
                return Err(CloudError::rejected(
                    "create_network_acl_entry",
                    network_acl_id,
                    "NetworkAclEntryAlreadyExists",
                ));
            }
            acl.entries.push(rule.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl ConfigServiceApi for FakeClient {
    async fn recorder_statuses(&self) -> Result<Vec<RecorderStatus>> {
        let region = self.region.clone();
        self.call("describe_configuration_recorder_status", &region, |s| {
            Ok(s.recorders.get(&region).cloned().into_iter().collect())
        })
    }

    async fn delivery_channel_statuses(&self) -> Result<Vec<DeliveryChannelStatus>> {
        let region = self.region.clone();
        self.call("describe_delivery_channel_status", &region, |s| {
            Ok(s.channels.get(&region).cloned().into_iter().collect())
        })
    }

    async fn put_recorder(&self, recorder: &RecorderSpec) -> Result<()> {
        let region = self.region.clone();
        self.call("put_configuration_recorder", &recorder.name, |s| {
            s.recorders
                .entry(region)
                .or_insert_with(|| RecorderStatus {
                    name: recorder.name.clone(),
                    recording: false,
                    last_status: None,
                });
            Ok(())
        })
    }

    async fn put_delivery_channel(&self, channel: &DeliveryChannelSpec) -> Result<()> {
        let region = self.region.clone();
        self.call("put_delivery_channel", &channel.name, |s| {
            s.channels.insert(
                region,
                DeliveryChannelStatus {
                    name: channel.name.clone(),
                    last_status: Some("SUCCESS".to_string()),
                },
            );
            Ok(())
        })
    }

    async fn start_recorder(&self, recorder_name: &str) -> Result<()> {
        let region = self.region.clone();
        self.call("start_configuration_recorder", recorder_name, |s| {
            let recorder = s
                .recorders
                .get_mut(&region)
                .ok_or_else(|| CloudError::NotFound(recorder_name.to_string()))?;
            recorder.recording = true;
            recorder.last_status = Some("SUCCESS".to_string());
            Ok(())
        })
    }
}

#[async_trait]
impl SnsApi for FakeClient {
    async fn get_topic_attributes(&self, topic_arn: &str) -> Result<()> {
        self.call("get_topic_attributes", topic_arn, |s| {
            if s.topics.contains(topic_arn) {
                Ok(())
            } else {
                Err(CloudError::NotFound(topic_arn.to_string()))
            }
        })
    }

    async fn create_topic(&self, name: &str) -> Result<String> {
        let arn = format!("arn:aws:sns:{}:{}:{}", self.region, ACCOUNT, name);
        self.call("create_topic", name, |s| {
            s.topics.insert(arn.clone());
            Ok(arn.clone())
        })
    }
}

#[async_trait]
impl LogsApi for FakeClient {
    async fn log_group_names(&self, prefix: &str) -> Result<Vec<String>> {
        let region = self.region.clone();
        self.call("describe_log_groups", prefix, |s| {
            Ok(s.log_groups
                .get(&region)
                .map(|groups| {
                    groups
                        .iter()
                        .filter(|g| g.starts_with(prefix))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    async fn create_log_group(&self, name: &str) -> Result<()> {
        let region = self.region.clone();
        self.call("create_log_group", name, |s| {
            s.log_groups
                .entry(region)
                .or_default()
                .push(name.to_string());
            Ok(())
        })
    }
}

#[async_trait]
impl S3Api for FakeClient {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.call("head_bucket", bucket, |s| {
            if s.buckets.contains(bucket) {
                Ok(())
            } else {
                Err(CloudError::NotFound(format!("bucket {}", bucket)))
            }
        })
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<()> {
        self.call("create_bucket", bucket, |s| {
            s.buckets.insert(bucket.to_string());
            Ok(())
        })
    }
}

pub const ADMIN_POLICY: &str = "arn:aws:iam::aws:policy/AdministratorAccess";
pub const CS_POLICY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";

pub fn identity_settings() -> IdentitySettings {
    IdentitySettings {
        saml_provider_name: "shibboleth".to_string(),
        saml_metadata: "<EntityDescriptor/>".to_string(),
        assume_role_policy: r#"{"Version":"2012-10-17","Statement":[]}"#.to_string(),
        admin_role_name: "shib-admin".to_string(),
        admin_policy_arn: ADMIN_POLICY.to_string(),
        cs_role_name: "shib-cs".to_string(),
        cs_policy_arn: CS_POLICY.to_string(),
        password_policy: PasswordPolicy {
            minimum_password_length: Some(14),
            require_symbols: Some(true),
            ..Default::default()
        },
    }
}

pub fn config_settings() -> ConfigServiceSettings {
    ConfigServiceSettings {
        bucket_name: format!("config-bucket-{}", ACCOUNT),
        topic_name: "config-topic".to_string(),
        role_name_prefix: "config-role".to_string(),
        assume_role_policy: r#"{"Version":"2012-10-17","Statement":[]}"#.to_string(),
        role_policy: Arc::new(|region: &str| -> Result<String> {
            Ok(format!(
                r#"{{"Version":"2012-10-17","Statement":[{{"Effect":"Allow","Resource":"arn:aws:sns:{}:*"}}]}}"#,
                region
            ))
        }),
    }
}

pub fn flow_settings() -> FlowLogSettings {
    FlowLogSettings {
        role_name: "flow-role".to_string(),
        assume_role_policy: r#"{"Version":"2012-10-17","Statement":[]}"#.to_string(),
        role_policy: r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"logs:*"}]}"#
            .to_string(),
    }
}

pub fn nacl_settings() -> NaclSettings {
    NaclSettings {
        entries: vec![
            NaclEntrySpec {
                protocol: ProtocolSpec::Name("tcp".to_string()),
                rule: RuleAction::Allow,
                cidr: "10.0.0.0/8".to_string(),
                from: Some(22),
                to: Some(22),
            },
            NaclEntrySpec {
                protocol: ProtocolSpec::Number(-1),
                rule: RuleAction::Deny,
                cidr: "0.0.0.0/0".to_string(),
                from: None,
                to: None,
            },
        ],
    }
}
