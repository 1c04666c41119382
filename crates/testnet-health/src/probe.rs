//! HTTP health check for nodes that serve a health endpoint.
//!
//! Each check opens a fresh HTTP/1 connection and issues a GET against the
//! configured path. Connection failures mean the node is still starting;
//! only responses that can never turn healthy are treated as fatal.

use std::time::Duration;

use http_body_util::Empty;
use tracing::debug;

use testnet_core::config::{DEFAULT_HEALTH_PATH, DEFAULT_PROBE_TIMEOUT};
use testnet_core::{ConfigResult, NodeId, WaitConfig};

use crate::check::{HealthCheck, HealthReport};
use crate::context::WaitContext;

/// Polls `http://{address}{path}` for a node.
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    node_id: NodeId,
    /// Listen address (ip:port). `None` until the node process is started.
    address: Option<String>,
    path: String,
    timeout: Duration,
}

impl HttpHealthCheck {
    pub fn new(node_id: impl Into<NodeId>, address: Option<String>) -> Self {
        Self {
            node_id: node_id.into(),
            address,
            path: DEFAULT_HEALTH_PATH.to_string(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn from_config(
        node_id: impl Into<NodeId>,
        address: Option<String>,
        config: &WaitConfig,
    ) -> ConfigResult<Self> {
        Ok(Self::new(node_id, address)
            .with_path(config.health_path.clone())
            .with_timeout(config.probe_timeout()?))
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HealthCheck for HttpHealthCheck {
    fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    async fn is_healthy(&self, ctx: &WaitContext) -> HealthReport {
        let Some(address) = self.address.as_deref() else {
            return HealthReport::not_running();
        };

        // Bounded by both the per-check timeout and the caller's deadline.
        let probe_ctx = ctx.child_with_timeout(self.timeout);
        tokio::select! {
            biased;
            report = http_probe(address, &self.path) => report,
            reason = probe_ctx.done() => {
                debug!(node_id = %self.node_id, %address, %reason, "health probe abandoned");
                HealthReport::not_ready()
            }
        }
    }
}

/// Perform a single GET against `http://{address}{path}`.
async fn http_probe(address: &str, path: &str) -> HealthReport {
    let uri = format!("http://{address}{path}");

    let stream = match tokio::net::TcpStream::connect(address).await {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, %uri, "health probe connection failed");
            return HealthReport::not_ready();
        }
    };

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => {
            debug!(error = %e, %uri, "health probe handshake failed");
            return HealthReport::not_ready();
        }
    };

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = match http::Request::builder()
        .method("GET")
        .uri(&uri)
        .header("host", address)
        .header("user-agent", "testnet-health/0.1")
        .body(Empty::<bytes::Bytes>::new())
    {
        Ok(req) => req,
        Err(e) => return HealthReport::failed(anyhow::anyhow!("invalid health uri {uri}: {e}")),
    };

    match sender.send_request(req).await {
        Ok(resp) => classify_status(resp.status(), &uri),
        Err(e) => {
            debug!(error = %e, %uri, "health probe request failed");
            HealthReport::not_ready()
        }
    }
}

/// 2xx is healthy, 5xx may still recover, anything else is fatal.
fn classify_status(status: http::StatusCode, uri: &str) -> HealthReport {
    if status.is_success() {
        HealthReport::healthy()
    } else if status.is_server_error() {
        debug!(%status, %uri, "health probe reported unhealthy");
        HealthReport::not_ready()
    } else {
        HealthReport::failed(anyhow::anyhow!("health endpoint {uri} returned {status}"))
    }
}
