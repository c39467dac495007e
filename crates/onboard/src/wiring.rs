//! Turns `onboard.yml` and the template directory into pipeline settings.
//!
//! Every template is rendered here, before the provider is contacted, so a
//! broken template never leaves the account half configured.

use anyhow::Context;
use onboard_cloud::{
    Concern, ConfigServiceSettings, FlowLogSettings, IdentitySettings, NaclSettings,
    RegionalPolicy, StackSettings,
};
use onboard_config::templates::{
    CONFIG_ASSUME_ROLE_POLICY, CONFIG_ROLE_POLICY, FLOW_ASSUME_ROLE_POLICY, FLOW_ROLE_POLICY,
    SAML_METADATA, SHIB_ASSUME_ROLE_POLICY,
};
use onboard_config::{OnboardConfig, PolicyTemplates, RegionalTemplate, TemplateVars};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stacks,
    ConfigService,
    FlowLogs,
    Nacls,
    Identity,
}

impl Step {
    /// Order of `onboard all`
    pub const ALL: [Step; 5] = [
        Step::Stacks,
        Step::ConfigService,
        Step::FlowLogs,
        Step::Nacls,
        Step::Identity,
    ];
}

pub fn concerns(
    steps: &[Step],
    config: &OnboardConfig,
    templates: &PolicyTemplates,
    cloudformation_dir: &Path,
) -> anyhow::Result<Vec<Concern>> {
    steps
        .iter()
        .map(|step| concern(*step, config, templates, cloudformation_dir))
        .collect()
}

pub fn concern(
    step: Step,
    config: &OnboardConfig,
    templates: &PolicyTemplates,
    cloudformation_dir: &Path,
) -> anyhow::Result<Concern> {
    let vars = TemplateVars::new(&config.account_number, &config.account_moniker);

    let concern = match step {
        Step::Stacks => Concern::Stacks(StackSettings::new(cloudformation_dir)),
        Step::ConfigService => {
            let bucket_name = config.config_bucket_name();
            let role_policy = RegionalTemplate::new(
                templates.clone(),
                CONFIG_ROLE_POLICY,
                vars.clone().with_bucket_name(&bucket_name),
            );
            // 各リージョンで描画されるので、ホームリージョンで先に検証しておく
            role_policy
                .render(&config.region)
                .context("config role policy")?;

            Concern::ConfigService(ConfigServiceSettings {
                bucket_name,
                topic_name: config.configservice_sns_topic_name.clone(),
                role_name_prefix: config.configservice_iam_role_name.clone(),
                assume_role_policy: templates
                    .render_document(CONFIG_ASSUME_ROLE_POLICY, &vars)?,
                role_policy: Arc::new(role_policy),
            })
        }
        Step::FlowLogs => Concern::FlowLogs(FlowLogSettings {
            role_name: config.flow_iam_role_name.clone(),
            assume_role_policy: templates.render_document(FLOW_ASSUME_ROLE_POLICY, &vars)?,
            role_policy: templates.render_document(FLOW_ROLE_POLICY, &vars)?,
        }),
        Step::Nacls => Concern::Nacls(NaclSettings {
            entries: config.nacls.clone(),
        }),
        Step::Identity => {
            let vars = vars.with_saml_provider(&config.shib_saml_provider);
            Concern::Identity(IdentitySettings {
                saml_provider_name: config.shib_saml_provider.clone(),
                saml_metadata: templates.read(SAML_METADATA)?,
                assume_role_policy: templates.render_document(SHIB_ASSUME_ROLE_POLICY, &vars)?,
                admin_role_name: config.shib_role_name.clone(),
                admin_policy_arn: config.shib_role_policy.clone(),
                cs_role_name: config.cs_role_name.clone(),
                cs_policy_arn: config.cs_role_policy.clone(),
                password_policy: config.iam_passwd_policy.clone(),
            })
        }
    };
    Ok(concern)
}
