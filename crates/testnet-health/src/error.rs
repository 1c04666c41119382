//! Errors surfaced by health waits.

use thiserror::Error;

use testnet_core::NodeId;

use crate::context::ContextError;

pub type WaitResult<T> = Result<T, WaitError>;

/// Why a wait ended without observing a healthy node.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The context carried no deadline, so the wait was refused.
    #[error("unable to wait for health of node \"{node_id}\" with a context without a deadline")]
    NoDeadline { node_id: NodeId },

    /// The health check reported an error other than "not running".
    #[error("failed to wait for health of node \"{node_id}\": {source}")]
    HealthCheck {
        node_id: NodeId,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to wait for health of node \"{node_id}\" before timeout: {source}")]
    Timeout {
        node_id: NodeId,
        #[source]
        source: ContextError,
    },

    #[error("wait for health of node \"{node_id}\" was cancelled: {source}")]
    Cancelled {
        node_id: NodeId,
        #[source]
        source: ContextError,
    },
}

impl WaitError {
    pub(crate) fn terminated(node_id: NodeId, reason: ContextError) -> Self {
        match reason {
            ContextError::DeadlineExceeded => Self::Timeout {
                node_id,
                source: reason,
            },
            ContextError::Cancelled => Self::Cancelled {
                node_id,
                source: reason,
            },
        }
    }

    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::NoDeadline { node_id }
            | Self::HealthCheck { node_id, .. }
            | Self::Timeout { node_id, .. }
            | Self::Cancelled { node_id, .. } => node_id,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
