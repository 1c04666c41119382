//! Error types for fixture configuration.

use thiserror::Error;

/// Result type alias for configuration lookups.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while interpreting a fixture configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration for `{field}`: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("`{0}` must be greater than zero")]
    ZeroDuration(&'static str),
}
