//! Reconciliation outcomes and the per-run report

use crate::descriptor::ResourceDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of reconciling one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum Outcome {
    /// Already in the desired state; nothing was changed
    AlreadySatisfied,
    /// Did not exist and was created
    Created,
    /// Existed but had to be brought back into the desired state
    Repaired,
    /// Deliberately not attempted (operator declined, no template)
    Skipped(String),
    /// Fatal; the run stops here
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Whether the provider was mutated
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::Repaired)
    }

    /// Combine the outcomes of several sub-resources into one.
    ///
    /// `Created` wins over `Repaired`, which wins over `AlreadySatisfied`.
    pub fn merge(self, other: Outcome) -> Outcome {
        use Outcome::*;
        match (self, other) {
            (Failed(r), _) | (_, Failed(r)) => Failed(r),
            (Created, _) | (_, Created) => Created,
            (Repaired, _) | (_, Repaired) => Repaired,
            (Skipped(r), AlreadySatisfied) | (AlreadySatisfied, Skipped(r)) => Skipped(r),
            (Skipped(r), Skipped(_)) => Skipped(r),
            (AlreadySatisfied, AlreadySatisfied) => AlreadySatisfied,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::AlreadySatisfied => write!(f, "unchanged"),
            Outcome::Created => write!(f, "created"),
            Outcome::Repaired => write!(f, "repaired"),
            Outcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome recorded for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub descriptor: ResourceDescriptor,
    pub outcome: Outcome,
}

/// Everything a run reconciled, in execution order.
///
/// Kept even when the run aborts so the operator can see how far it got.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            steps: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, descriptor: ResourceDescriptor, outcome: Outcome) {
        self.steps.push(StepResult {
            descriptor,
            outcome,
        });
    }

    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|s| s.outcome.is_failure())
    }

    pub fn failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.outcome.is_failure())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for step in &self.steps {
            match step.outcome {
                Outcome::AlreadySatisfied => summary.unchanged += 1,
                Outcome::Created => summary.created += 1,
                Outcome::Repaired => summary.repaired += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub repaired: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} repaired, {} unchanged, {} skipped, {} failed",
            self.created, self.repaired, self.unchanged, self.skipped, self.failed
        )
    }
}
