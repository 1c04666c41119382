//! The health wait loop.
//!
//! [`HealthWaiter`] checks the target immediately, then once per poll
//! interval, until the target is healthy, reports a fatal error, or the
//! context is done. Between checks the loop races the ticker against the
//! context; a check already in flight is never interrupted.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub use testnet_core::DEFAULT_POLL_INTERVAL;
use testnet_core::{ConfigResult, WaitConfig};

use crate::check::{HealthCheck, HealthCheckOutcome};
use crate::context::WaitContext;
use crate::error::{WaitError, WaitResult};

/// Polls a [`HealthCheck`] on a fixed cadence.
#[derive(Debug, Clone, Copy)]
pub struct HealthWaiter {
    poll_interval: Duration,
}

impl Default for HealthWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthWaiter {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Use a custom poll interval.
    ///
    /// Unlike [`WaitConfig::poll_interval`], which rejects zero, this
    /// constructor clamps anything below 1ms up to 1ms: the ticker cannot
    /// run with a zero period.
    pub fn with_poll_interval(interval: Duration) -> Self {
        Self {
            poll_interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_config(config: &WaitConfig) -> ConfigResult<Self> {
        Ok(Self::with_poll_interval(config.poll_interval()?))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Block until `target` reports healthy.
    ///
    /// Fails immediately if `ctx` has no deadline. Otherwise returns the
    /// first fatal check error, or a timeout/cancellation error once `ctx`
    /// is done while the target is still not ready.
    pub async fn wait_for_healthy<T>(&self, ctx: &WaitContext, target: &T) -> WaitResult<()>
    where
        T: HealthCheck,
    {
        let node_id = target.node_id();
        if ctx.deadline().is_none() {
            warn!(%node_id, "refusing to wait for health without a deadline");
            return Err(WaitError::NoDeadline {
                node_id: node_id.clone(),
            });
        }

        let start = Instant::now();
        // First tick one interval out: the first check runs immediately.
        let mut ticker = time::interval_at(start + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let report = target.is_healthy(ctx).await;
            if report.is_healthy() {
                if let Some(err) = report.error() {
                    debug!(%node_id, error = %err, "ignoring error reported with healthy status");
                }
            }

            match report.classify() {
                HealthCheckOutcome::Healthy => {
                    info!(
                        %node_id,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "node is healthy"
                    );
                    return Ok(());
                }
                HealthCheckOutcome::NotReady => {
                    debug!(%node_id, attempt, "node not healthy yet");
                }
                HealthCheckOutcome::Fatal(source) => {
                    warn!(%node_id, attempt, error = %source, "health check failed");
                    return Err(WaitError::HealthCheck {
                        node_id: node_id.clone(),
                        source,
                    });
                }
            }

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    warn!(
                        %node_id,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        reason = %reason,
                        "gave up waiting for node health"
                    );
                    return Err(WaitError::terminated(node_id.clone(), reason));
                }
                _ = ticker.tick() => {}
            }
        }
    }

    /// Wait for each target in order under the same context.
    ///
    /// Stops at the first target that fails; later targets are not checked.
    pub async fn wait_for_all_healthy<T>(&self, ctx: &WaitContext, targets: &[T]) -> WaitResult<()>
    where
        T: HealthCheck,
    {
        for target in targets {
            self.wait_for_healthy(ctx, target).await?;
        }
        debug!(nodes = targets.len(), "all nodes healthy");
        Ok(())
    }
}

/// [`HealthWaiter::wait_for_healthy`] with the default poll interval.
pub async fn wait_for_healthy<T>(ctx: &WaitContext, target: &T) -> WaitResult<()>
where
    T: HealthCheck,
{
    HealthWaiter::new().wait_for_healthy(ctx, target).await
}

/// [`HealthWaiter::wait_for_all_healthy`] with the default poll interval.
pub async fn wait_for_all_healthy<T>(ctx: &WaitContext, targets: &[T]) -> WaitResult<()>
where
    T: HealthCheck,
{
    HealthWaiter::new().wait_for_all_healthy(ctx, targets).await
}
