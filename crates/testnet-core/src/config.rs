//! Fixture configuration parser.
//!
//! Wait timing lives in the `[health]` table of a fixture TOML file:
//!
//! ```toml
//! [health]
//! poll_interval = "50ms"
//! probe_timeout = "2s"
//! health_path = "/ext/health"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Delay between consecutive health checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Upper bound on a single health check.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_HEALTH_PATH: &str = "/ext/health";

/// Top-level fixture configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub health: WaitConfig,
}

/// Timing and endpoint settings for health waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Delay between consecutive health checks.
    pub poll_interval: String,
    /// Upper bound on a single health check.
    pub probe_timeout: String,
    /// HTTP path queried by HTTP health checks.
    pub health_path: String,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: format_duration(DEFAULT_POLL_INTERVAL),
            probe_timeout: format_duration(DEFAULT_PROBE_TIMEOUT),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

impl WaitConfig {
    /// Load the `[health]` table from a fixture TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: FixtureConfig = toml::from_str(content)?;
        Ok(config.health)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        let config = FixtureConfig {
            health: self.clone(),
        };
        Ok(toml::to_string_pretty(&config)?)
    }

    /// Parsed poll interval. Zero is rejected since it would spin.
    pub fn poll_interval(&self) -> ConfigResult<Duration> {
        let interval = parse_field("poll_interval", &self.poll_interval)?;
        if interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll_interval"));
        }
        Ok(interval)
    }

    pub fn probe_timeout(&self) -> ConfigResult<Duration> {
        let timeout = parse_field("probe_timeout", &self.probe_timeout)?;
        if timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("probe_timeout"));
        }
        Ok(timeout)
    }
}

fn parse_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

/// Render a duration in the form [`parse_duration`] reads back.
///
/// Whole seconds print as "5s", anything else as milliseconds.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 && d.as_secs() > 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
