pub mod config;
pub mod error;
pub mod json;
pub mod node;

pub use config::{
    DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT, FixtureConfig, WaitConfig, format_duration,
    parse_duration,
};
pub use error::{ConfigError, ConfigResult};
pub use json::{default_json_marshal, write_json_file};
pub use node::NodeId;
