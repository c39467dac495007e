//! Onboard reconciliation engine
//!
//! This crate brings a freshly created cloud account into its baseline
//! security posture. Every resource goes through the same loop: probe the
//! provider, decide whether the live state already satisfies the desired
//! configuration, create or repair it when not, and wait for the provider
//! to converge. Running it twice is a no-op the second time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   onboard CLI                    │
//! │          (onboard stacks / all / nacls)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 onboard-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Sequencer (stacks → config-service →    │   │
//! │  │  flow-logs → nacls → identity)           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Reconcilers  │  │ Region fan-  │            │
//! │  │ + Probe      │  │ out, Waiter  │            │
//! │  └──────────────┘  └──────────────┘            │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider { iam, ec2, ... }   │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────────────────────┬─────────────────────────┘
//!                         │
//!                 ┌───────▼───────┐
//!                 │ onboard-cloud │
//!                 │     -aws      │
//!                 └───────────────┘
//! ```

pub mod context;
pub mod descriptor;
pub mod error;
pub mod nacl;
pub mod outcome;
pub mod pipeline;
pub mod probe;
pub mod provider;
pub mod reconcile;
pub mod regions;
pub mod session;
pub mod waiter;

// Re-exports
pub use context::{AccountContext, RegionSet};
pub use descriptor::{ResourceDescriptor, ResourceKind, Scope};
pub use error::{CloudError, Result};
pub use nacl::{NaclEntrySpec, NaclRule, PortRange, ProtocolSpec, RuleAction};
pub use outcome::{Outcome, ReportSummary, RunReport, StepResult};
pub use pipeline::{
    AssumeYes, Concern, ConfigServiceSettings, Confirm, FlowLogSettings, IdentitySettings,
    NaclSettings, RegionalPolicy, Sequencer, StackKind, StackSettings,
};
pub use probe::{Probe, probe};
pub use provider::{
    CloudProvider, ConfigServiceApi, CreateFlowLog, CreateStack, DeliveryChannelSpec,
    DeliveryChannelStatus, Ec2Api, FlowLogInfo, IamApi, LogsApi, NetworkAcl, PasswordPolicy,
    RecorderSpec, RecorderStatus, RoleInfo, S3Api, SnsApi, StackApi, StackStatus, WaitConfig,
};
pub use session::Session;
