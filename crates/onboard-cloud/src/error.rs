//! Cloud reconciliation error types

use thiserror::Error;

/// Errors raised while reconciling provider resources.
///
/// Only [`CloudError::NotFound`] is an expected signal: the existence probe
/// turns it into the create path. Everything else aborts the run.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{resource} was created but is not visible yet: {message}")]
    TransientRace { resource: String, message: String },

    #[error("{operation} rejected for {resource}: {message}")]
    Rejected {
        operation: String,
        resource: String,
        message: String,
    },

    #[error("stack {stack} could not be created; it was rolled back and deleted cleanly")]
    StackRolledBack { stack: String },

    #[error(
        "stack {stack} could not be created and deleting it failed ({status}); see the CloudFormation console"
    )]
    StackDeleteFailed { stack: String, status: String },

    #[error("stack {stack} exists in state {status}; see the CloudFormation console")]
    StackUnhealthy { stack: String, status: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn rejected(
        operation: impl Into<String>,
        resource: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Rejected {
            operation: operation.into(),
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// The provider's "resource does not exist" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Not-found hit while configuring something this run just created.
    pub fn is_transient_race(&self) -> bool {
        matches!(self, Self::TransientRace { .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
