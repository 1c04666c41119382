//! The health-check capability and classification of its results.
//!
//! A check reports a boolean plus an optional error. The waiter only cares
//! about three outcomes, so every report is folded into a
//! [`HealthCheckOutcome`] before the loop decides what to do next.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use testnet_core::NodeId;

use crate::context::WaitContext;

/// Error attached to a health report.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The node process is not running yet. Equivalent to "not ready".
    #[error("not running")]
    NotRunning,

    /// Any other failure. Ends the wait.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Raw result of a single health check.
#[derive(Debug)]
pub struct HealthReport {
    healthy: bool,
    error: Option<CheckError>,
}

/// What the waiter does with a report.
#[derive(Debug)]
pub enum HealthCheckOutcome {
    Healthy,
    NotReady,
    Fatal(anyhow::Error),
}

impl HealthReport {
    pub fn new(healthy: bool, error: Option<CheckError>) -> Self {
        Self { healthy, error }
    }

    pub fn healthy() -> Self {
        Self::new(true, None)
    }

    pub fn not_ready() -> Self {
        Self::new(false, None)
    }

    pub fn not_running() -> Self {
        Self::new(false, Some(CheckError::NotRunning))
    }

    pub fn failed(err: impl Into<anyhow::Error>) -> Self {
        Self::new(false, Some(CheckError::Failed(err.into())))
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn error(&self) -> Option<&CheckError> {
        self.error.as_ref()
    }

    /// Fold the report into an outcome.
    ///
    /// `healthy` takes precedence: an error reported alongside it is
    /// dropped.
    pub fn classify(self) -> HealthCheckOutcome {
        if self.healthy {
            return HealthCheckOutcome::Healthy;
        }
        match self.error {
            None | Some(CheckError::NotRunning) => HealthCheckOutcome::NotReady,
            Some(CheckError::Failed(err)) => HealthCheckOutcome::Fatal(err),
        }
    }
}

impl From<Result<bool, CheckError>> for HealthReport {
    fn from(result: Result<bool, CheckError>) -> Self {
        match result {
            Ok(healthy) => Self::new(healthy, None),
            Err(err) => Self::new(false, Some(err)),
        }
    }
}

/// Something whose readiness can be queried, typically a test network node.
///
/// Implementations must tolerate repeated calls and should give up when
/// `ctx` is done, so one call cannot outlive the wait that issued it.
pub trait HealthCheck: Send + Sync {
    fn node_id(&self) -> &NodeId;

    fn is_healthy(&self, ctx: &WaitContext) -> impl Future<Output = HealthReport> + Send;
}

impl<T: HealthCheck> HealthCheck for Arc<T> {
    fn node_id(&self) -> &NodeId {
        (**self).node_id()
    }

    fn is_healthy(&self, ctx: &WaitContext) -> impl Future<Output = HealthReport> + Send {
        (**self).is_healthy(ctx)
    }
}
