//! Federated identity and account-wide settings: SAML provider, admin and
//! CS roles, account alias, password policy

use super::Sequencer;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::Result;
use crate::provider::PasswordPolicy;
use crate::reconcile::{
    RoleSpec, reconcile_account_alias, reconcile_password_policy, reconcile_role,
    reconcile_saml_provider,
};

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub saml_provider_name: String,
    /// IdP metadata XML
    pub saml_metadata: String,
    /// Trust policy shared by both federated roles
    pub assume_role_policy: String,
    pub admin_role_name: String,
    pub admin_policy_arn: String,
    pub cs_role_name: String,
    pub cs_policy_arn: String,
    pub password_policy: PasswordPolicy,
}

impl IdentitySettings {
    pub fn roles(&self) -> [RoleSpec; 2] {
        [
            RoleSpec::new(&self.admin_role_name, &self.assume_role_policy)
                .with_managed_policy(&self.admin_policy_arn),
            RoleSpec::new(&self.cs_role_name, &self.assume_role_policy)
                .with_managed_policy(&self.cs_policy_arn),
        ]
    }
}

pub async fn run(seq: &Sequencer<'_>, settings: &IdentitySettings) -> Result<()> {
    let session = seq.session();
    let ctx = session.context();
    let iam = session.provider().iam();
    let iam = iam.as_ref();

    seq.step(
        ResourceDescriptor::global(ResourceKind::SamlProvider, &settings.saml_provider_name),
        reconcile_saml_provider(
            iam,
            &ctx.saml_provider_arn(&settings.saml_provider_name),
            &settings.saml_provider_name,
            &settings.saml_metadata,
        ),
    )
    .await?;

    for role in settings.roles() {
        seq.step(role.descriptor(), reconcile_role(iam, &role, session.wait()))
            .await?;
    }

    seq.step(
        ResourceDescriptor::global(ResourceKind::AccountAlias, &ctx.account_moniker),
        reconcile_account_alias(iam, &ctx.account_moniker),
    )
    .await?;

    seq.step(
        ResourceDescriptor::global(ResourceKind::PasswordPolicy, "account"),
        reconcile_password_policy(iam, &settings.password_policy),
    )
    .await?;

    Ok(())
}
