//! Orchestration sequencer
//!
//! Each bootstrap concern is a fixed, strictly sequential pipeline of
//! reconciliations. The sequencer records every outcome and stops at the
//! first fatal one: later steps never start.

pub mod config_service;
pub mod flow_logs;
pub mod identity;
pub mod nacls;
pub mod stacks;

use crate::context::RegionSet;
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::Result;
use crate::outcome::{Outcome, RunReport};
use crate::session::Session;
use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

pub use config_service::{ConfigServiceSettings, RegionalPolicy};
pub use flow_logs::FlowLogSettings;
pub use identity::IdentitySettings;
pub use nacls::NaclSettings;
pub use stacks::{AssumeYes, Confirm, StackKind, StackSettings};

/// One bootstrap concern and its desired configuration
pub enum Concern {
    Stacks(StackSettings),
    ConfigService(ConfigServiceSettings),
    FlowLogs(FlowLogSettings),
    Nacls(NaclSettings),
    Identity(IdentitySettings),
}

impl Concern {
    pub fn name(&self) -> &'static str {
        match self {
            Concern::Stacks(_) => "stacks",
            Concern::ConfigService(_) => "config-service",
            Concern::FlowLogs(_) => "flow-logs",
            Concern::Nacls(_) => "nacls",
            Concern::Identity(_) => "identity",
        }
    }
}

/// Drives pipelines against one session and collects the run report
pub struct Sequencer<'s> {
    session: &'s Session,
    confirm: &'s dyn Confirm,
    report: Mutex<RunReport>,
    started: Instant,
}

impl<'s> Sequencer<'s> {
    pub fn new(session: &'s Session, confirm: &'s dyn Confirm) -> Self {
        Self {
            session,
            confirm,
            report: Mutex::new(RunReport::new()),
            started: Instant::now(),
        }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub(crate) fn confirm(&self, question: &str) -> Result<bool> {
        self.confirm.confirm(question)
    }

    /// Run the concerns in order, stopping at the first fatal error
    pub async fn run(&self, concerns: &[Concern]) -> Result<()> {
        for concern in concerns {
            tracing::info!("Running {}", concern.name());
            match concern {
                Concern::Stacks(settings) => stacks::run(self, settings).await?,
                Concern::ConfigService(settings) => config_service::run(self, settings).await?,
                Concern::FlowLogs(settings) => flow_logs::run(self, settings).await?,
                Concern::Nacls(settings) => nacls::run(self, settings).await?,
                Concern::Identity(settings) => identity::run(self, settings).await?,
            }
        }
        Ok(())
    }

    /// Await one reconciliation and record its outcome.
    ///
    /// An error is recorded as [`Outcome::Failed`] and handed back so the
    /// caller can abort with `?`.
    pub async fn step<F>(&self, descriptor: ResourceDescriptor, reconcile: F) -> Result<Outcome>
    where
        F: Future<Output = Result<Outcome>>,
    {
        match reconcile.await {
            Ok(outcome) => {
                tracing::debug!("{}: {}", descriptor, outcome);
                self.record(descriptor, outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("{}: {}", descriptor, e);
                self.record(descriptor, Outcome::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Like [`Sequencer::step`] for reconcilers that report several
    /// resources; a failure is recorded against `on_failure`.
    pub async fn steps<F>(&self, on_failure: ResourceDescriptor, reconcile: F) -> Result<()>
    where
        F: Future<Output = Result<Vec<(ResourceDescriptor, Outcome)>>>,
    {
        match reconcile.await {
            Ok(outcomes) => {
                for (descriptor, outcome) in outcomes {
                    self.record(descriptor, outcome);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("{}: {}", on_failure, e);
                self.record(on_failure, Outcome::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Record a failure raised outside a reconciliation, such as a policy
    /// that does not render.
    pub fn check<T>(&self, descriptor: ResourceDescriptor, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            tracing::error!("{}: {}", descriptor, e);
            self.record(descriptor, Outcome::Failed(e.to_string()));
            e
        })
    }

    /// Enabled regions; a failed lookup is recorded against the home region
    pub async fn regions(&self) -> Result<&'s RegionSet> {
        let result = self.session.regions().await;
        self.check(
            ResourceDescriptor::regional(
                ResourceKind::RegionSet,
                &self.session.context().home_region,
                "enabled",
            ),
            result,
        )
    }

    pub fn record(&self, descriptor: ResourceDescriptor, outcome: Outcome) {
        let mut report = self.report.lock().unwrap_or_else(|e| e.into_inner());
        report.record(descriptor, outcome);
    }

    /// Snapshot of what has been recorded so far
    pub fn report(&self) -> RunReport {
        let mut report = self
            .report
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        report.duration_ms = self.started.elapsed().as_millis() as u64;
        report
    }

    pub fn into_report(self) -> RunReport {
        let mut report = self.report.into_inner().unwrap_or_else(|e| e.into_inner());
        report.duration_ms = self.started.elapsed().as_millis() as u64;
        report
    }
}
