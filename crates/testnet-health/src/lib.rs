//! testnet-health — waiting for test network nodes to become healthy.
//!
//! Health is observed, not signaled: a fixture that has started a node
//! polls the node's health check until it reports healthy, reports a
//! fatal error, or the caller's deadline elapses.
//!
//! # Architecture
//!
//! ```text
//! HealthWaiter::wait_for_healthy(ctx, target)
//!   ├── pre-flight: ctx must carry a deadline
//!   └── loop
//!       ├── target.is_healthy(ctx) → HealthReport → HealthCheckOutcome
//!       │     Healthy → Ok / NotReady → retry / Fatal → Err
//!       └── select { ctx.done() → Timeout | Cancelled, ticker.tick() }
//! ```
//!
//! The deadline and cancellation signal travel together in a
//! [`WaitContext`]. Targets implement [`HealthCheck`]; [`HttpHealthCheck`]
//! covers nodes that expose an HTTP health endpoint.

pub mod check;
pub mod context;
pub mod error;
pub mod probe;
pub mod waiter;

pub use check::{CheckError, HealthCheck, HealthCheckOutcome, HealthReport};
pub use context::{ContextError, WaitContext};
pub use error::{WaitError, WaitResult};
pub use probe::HttpHealthCheck;
pub use waiter::{DEFAULT_POLL_INTERVAL, HealthWaiter, wait_for_all_healthy, wait_for_healthy};
