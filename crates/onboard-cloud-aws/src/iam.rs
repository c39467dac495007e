//! IAM: roles, policies, SAML provider, account alias, password policy

use crate::error::AwsError;
use async_trait::async_trait;
use onboard_cloud::{IamApi, PasswordPolicy, Result, RoleInfo};
use percent_encoding::percent_decode_str;

pub struct AwsIam {
    client: aws_sdk_iam::Client,
}

impl AwsIam {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

fn role_info(
    role: Option<&aws_sdk_iam::types::Role>,
    operation: &'static str,
) -> Result<RoleInfo> {
    let role = role.ok_or(AwsError::MissingField {
        operation,
        field: "role",
    })?;
    Ok(RoleInfo {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
    })
}

/// IAM returns policy documents URL-encoded
pub(crate) fn decode_policy(
    resource: &str,
    document: &str,
) -> std::result::Result<String, AwsError> {
    percent_decode_str(document)
        .decode_utf8()
        .map(|doc| doc.into_owned())
        .map_err(|e| AwsError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
impl IamApi for AwsIam {
    async fn get_role(&self, role_name: &str) -> Result<RoleInfo> {
        let output = self
            .client
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetRole", role_name, e))?;
        role_info(output.role(), "GetRole")
    }

    async fn create_role(&self, role_name: &str, assume_role_policy: &str) -> Result<RoleInfo> {
        let output = self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(assume_role_policy)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateRole", role_name, e))?;
        role_info(output.role(), "CreateRole")
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .into_paginator()
            .send();

        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| AwsError::from_sdk("ListAttachedRolePolicies", role_name, e))?;
            arns.extend(
                page.attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn())
                    .map(str::to_string),
            );
        }
        Ok(arns)
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("AttachRolePolicy", role_name, e))?;
        Ok(())
    }

    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> Result<String> {
        let resource = format!("{}/{}", role_name, policy_name);
        let output = self
            .client
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetRolePolicy", &resource, e))?;
        Ok(decode_policy(&resource, output.policy_document())?)
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        document: &str,
    ) -> Result<()> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| {
                AwsError::from_sdk("PutRolePolicy", &format!("{}/{}", role_name, policy_name), e)
            })?;
        Ok(())
    }

    async fn get_saml_provider(&self, arn: &str) -> Result<()> {
        self.client
            .get_saml_provider()
            .saml_provider_arn(arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetSAMLProvider", arn, e))?;
        Ok(())
    }

    async fn create_saml_provider(&self, name: &str, metadata_document: &str) -> Result<String> {
        let output = self
            .client
            .create_saml_provider()
            .name(name)
            .saml_metadata_document(metadata_document)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateSAMLProvider", name, e))?;
        let arn = output.saml_provider_arn().ok_or(AwsError::MissingField {
            operation: "CreateSAMLProvider",
            field: "SAMLProviderArn",
        })?;
        Ok(arn.to_string())
    }

    async fn list_account_aliases(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_account_aliases()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("ListAccountAliases", "account", e))?;
        Ok(output.account_aliases().to_vec())
    }

    async fn create_account_alias(&self, alias: &str) -> Result<()> {
        self.client
            .create_account_alias()
            .account_alias(alias)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateAccountAlias", alias, e))?;
        Ok(())
    }

    async fn get_password_policy(&self) -> Result<PasswordPolicy> {
        let output = self
            .client
            .get_account_password_policy()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetAccountPasswordPolicy", "password policy", e))?;
        let policy = output.password_policy().ok_or(AwsError::MissingField {
            operation: "GetAccountPasswordPolicy",
            field: "PasswordPolicy",
        })?;

        Ok(PasswordPolicy {
            minimum_password_length: policy.minimum_password_length(),
            require_symbols: Some(policy.require_symbols()),
            require_numbers: Some(policy.require_numbers()),
            require_uppercase_characters: Some(policy.require_uppercase_characters()),
            require_lowercase_characters: Some(policy.require_lowercase_characters()),
            allow_users_to_change_password: Some(policy.allow_users_to_change_password()),
            max_password_age: policy.max_password_age(),
            password_reuse_prevention: policy.password_reuse_prevention(),
            hard_expiry: policy.hard_expiry(),
        })
    }

    async fn update_password_policy(&self, policy: &PasswordPolicy) -> Result<()> {
        self.client
            .update_account_password_policy()
            .set_minimum_password_length(policy.minimum_password_length)
            .set_require_symbols(policy.require_symbols)
            .set_require_numbers(policy.require_numbers)
            .set_require_uppercase_characters(policy.require_uppercase_characters)
            .set_require_lowercase_characters(policy.require_lowercase_characters)
            .set_allow_users_to_change_password(policy.allow_users_to_change_password)
            .set_max_password_age(policy.max_password_age)
            .set_password_reuse_prevention(policy.password_reuse_prevention)
            .set_hard_expiry(policy.hard_expiry)
            .send()
            .await
            .map_err(|e| {
                AwsError::from_sdk("UpdateAccountPasswordPolicy", "password policy", e)
            })?;
        Ok(())
    }
}
