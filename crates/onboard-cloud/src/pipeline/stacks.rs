//! Audit and VPC CloudFormation stacks (interactive)

use super::Sequencer;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::Result;
use crate::outcome::Outcome;
use crate::reconcile::{StackSpec, reconcile_stack};
use std::path::{Path, PathBuf};

/// Operator yes/no gate in front of stack creation
pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Answers yes to everything (`--yes`)
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, question: &str) -> Result<bool> {
        tracing::debug!("{} [assumed yes]", question);
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Audit,
    Vpc,
}

impl StackKind {
    /// Pipeline order
    pub const ALL: [StackKind; 2] = [StackKind::Audit, StackKind::Vpc];

    /// Suffix of the stack name and template file
    pub fn suffix(&self) -> &'static str {
        match self {
            StackKind::Audit => "audit",
            StackKind::Vpc => "vpc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StackKind::Audit => "Auditing",
            StackKind::Vpc => "VPC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackSettings {
    /// Directory holding `<moniker>-<kind>.json`
    pub template_dir: PathBuf,
    pub kinds: Vec<StackKind>,
}

impl StackSettings {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            kinds: StackKind::ALL.to_vec(),
        }
    }
}

pub fn template_path(template_dir: &Path, stack_name: &str) -> PathBuf {
    template_dir.join(format!("{}.json", stack_name))
}

/// Audit stack, then VPC stack.
///
/// A missing template or a "no" from the operator skips that stack without
/// failing the run.
pub async fn run(seq: &Sequencer<'_>, settings: &StackSettings) -> Result<()> {
    let session = seq.session();
    let stacks = session.provider().stacks();

    for kind in &settings.kinds {
        let stack_name = session.context().monikered(kind.suffix());
        let descriptor = ResourceDescriptor::global(ResourceKind::Stack, &stack_name);
        let path = template_path(&settings.template_dir, &stack_name);

        if !tokio::fs::try_exists(&path).await? {
            tracing::info!(
                "No {} CloudFormation template at {}, continuing",
                kind.label(),
                path.display()
            );
            seq.record(descriptor, Outcome::Skipped("no template".to_string()));
            continue;
        }

        let question = format!(
            "Do you want to apply the {} CloudFormation template to this account?",
            kind.label()
        );
        if !seq.confirm(&question)? {
            tracing::info!("Skipping {} CloudFormation template", kind.label());
            seq.record(descriptor, Outcome::Skipped("declined".to_string()));
            continue;
        }

        let spec = StackSpec {
            name: stack_name,
            template_body: tokio::fs::read_to_string(&path).await?,
        };
        seq.step(
            descriptor,
            reconcile_stack(stacks.as_ref(), &spec, session.wait()),
        )
        .await?;
    }

    Ok(())
}
