//! ポリシーテンプレート
//!
//! IAM policy documents live as tera templates in the templates directory
//! and are rendered with the account's values. Rendered JSON templates are
//! parsed once so a typo is caught before anything is sent to the provider.

use crate::error::{ConfigError, Result};
use onboard_cloud::{CloudError, RegionalPolicy};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

pub const CONFIG_ROLE_POLICY: &str = "configservice-role-policy.json";
pub const CONFIG_ASSUME_ROLE_POLICY: &str = "configservice-assume-role-policy.json";
pub const FLOW_ROLE_POLICY: &str = "flow-role-policy.json";
pub const FLOW_ASSUME_ROLE_POLICY: &str = "flow-assume-role-policy.json";
pub const SHIB_ASSUME_ROLE_POLICY: &str = "shib-assume-role-policy.json";
pub const CLOUDTRAIL_BUCKET_POLICY: &str = "cloudformation-cloudtrail-policy.json";
/// IdP metadata, used verbatim
pub const SAML_METADATA: &str = "shibidp-md.xml";

/// Variables available to every template
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateVars {
    pub account_number: String,
    pub account_moniker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saml_provider: Option<String>,
}

impl TemplateVars {
    pub fn new(account_number: impl Into<String>, account_moniker: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            account_moniker: account_moniker.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_bucket_name(mut self, bucket_name: impl Into<String>) -> Self {
        self.bucket_name = Some(bucket_name.into());
        self
    }

    pub fn with_saml_provider(mut self, saml_provider: impl Into<String>) -> Self {
        self.saml_provider = Some(saml_provider.into());
        self
    }
}

/// Template directory
#[derive(Debug, Clone)]
pub struct PolicyTemplates {
    dir: PathBuf,
}

impl PolicyTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Raw file contents
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(ConfigError::TemplateNotFound { path });
        }
        Ok(std::fs::read_to_string(&path)?)
    }

    /// Render `name` with `vars`
    pub fn render(&self, name: &str, vars: &TemplateVars) -> Result<String> {
        let source = self.read(name)?;
        render_str(name, &source, vars)
    }

    /// Render and parse a JSON template
    pub fn render_json(&self, name: &str, vars: &TemplateVars) -> Result<serde_json::Value> {
        let rendered = self.render(name, vars)?;
        serde_json::from_str(&rendered).map_err(|source| ConfigError::Json {
            name: name.to_string(),
            source,
        })
    }

    /// Render a JSON template and hand back the text, checking it parses
    pub fn render_document(&self, name: &str, vars: &TemplateVars) -> Result<String> {
        let rendered = self.render(name, vars)?;
        serde_json::from_str::<serde_json::Value>(&rendered).map_err(|source| {
            ConfigError::Json {
                name: name.to_string(),
                source,
            }
        })?;
        Ok(rendered)
    }
}

fn render_str(name: &str, source: &str, vars: &TemplateVars) -> Result<String> {
    let context = Context::from_serialize(vars).map_err(|e| render_error(name, &e))?;
    Tera::one_off(source, &context, false).map_err(|e| render_error(name, &e))
}

/// Tera hides the useful part (e.g. the undefined variable) in the source chain
fn render_error(name: &str, e: &tera::Error) -> ConfigError {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }
    ConfigError::Render {
        name: name.to_string(),
        message: details.join(" | "),
    }
}

/// A template rendered once per region, e.g. the config role policy
pub struct RegionalTemplate {
    templates: PolicyTemplates,
    name: String,
    vars: TemplateVars,
}

impl RegionalTemplate {
    pub fn new(templates: PolicyTemplates, name: impl Into<String>, vars: TemplateVars) -> Self {
        Self {
            templates,
            name: name.into(),
            vars,
        }
    }
}

impl RegionalPolicy for RegionalTemplate {
    fn render(&self, region: &str) -> onboard_cloud::Result<String> {
        let vars = self.vars.clone().with_region(region);
        self.templates
            .render_document(&self.name, &vars)
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))
    }
}
