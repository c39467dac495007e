//! Existence probe
//!
//! Turns the result of a read-only provider call into an explicit tag so
//! reconcilers branch on `Found` / `NotFound` instead of catching errors.

use crate::error::{CloudError, Result};
use std::future::Future;

/// Result of probing a resource
#[derive(Debug)]
pub enum Probe<T> {
    Found(T),
    NotFound,
    Error(CloudError),
}

impl<T> Probe<T> {
    /// Classify a provider read result.
    ///
    /// Only the provider's not-found signal becomes [`Probe::NotFound`];
    /// every other error stays an error.
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Probe::Found(value),
            Err(e) if e.is_not_found() => Probe::NotFound,
            Err(e) => Probe::Error(e),
        }
    }

    /// `Some` when found, `None` when absent, `Err` otherwise
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Probe::Found(value) => Ok(Some(value)),
            Probe::NotFound => Ok(None),
            Probe::Error(e) => Err(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }
}

/// Await a read call and classify it
pub async fn probe<T>(call: impl Future<Output = Result<T>>) -> Probe<T> {
    let probe = Probe::from_result(call.await);
    match &probe {
        Probe::Found(_) => tracing::debug!("probe: found"),
        Probe::NotFound => tracing::debug!("probe: not found"),
        Probe::Error(e) => tracing::debug!("probe: error: {}", e),
    }
    probe
}
