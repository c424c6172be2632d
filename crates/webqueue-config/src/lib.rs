//! KDL configuration parsing for the webqueue job server.
//!
//! This crate handles parsing of the server configuration (webqueue.kdl):
//! listen address, storage locations, worker delay and log format.

pub mod error;
pub mod system;

pub use error::{ConfigError, ConfigResult};
pub use system::{LogFormat, SystemConfig, load_system_config, parse_system_config};
