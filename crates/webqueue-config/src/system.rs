//! System configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_LEDGER: &str = "qu.json";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_DELAY_MS: u64 = 10_000;

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Address to bind the HTTP listener to.
    pub host: String,
    /// HTTP listen port.
    pub port: u16,
    /// Path of the queue ledger document.
    pub ledger_path: PathBuf,
    /// Root directory for per-job result records.
    pub results_dir: PathBuf,
    /// Duration of the placeholder execution step.
    pub execution_delay: Duration,
    pub log_format: LogFormat,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ledger_path: PathBuf::from(DEFAULT_LEDGER),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            execution_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            log_format: LogFormat::default(),
        }
    }
}

/// Read and parse a configuration file.
pub fn load_system_config(path: &Path) -> ConfigResult<SystemConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_system_config(&content)
}

/// Parse system configuration from KDL text. Missing nodes keep their defaults.
pub fn parse_system_config(kdl: &str) -> ConfigResult<SystemConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = SystemConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "server" => parse_server(node, &mut config)?,
            "storage" => parse_storage(node, &mut config),
            "worker" => parse_worker(node, &mut config)?,
            "logging" => parse_logging(node, &mut config)?,
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(config)
}

fn parse_server(node: &KdlNode, config: &mut SystemConfig) -> ConfigResult<()> {
    for child in child_nodes(node) {
        match child.name().value() {
            "host" => {
                if let Some(host) = get_first_string_arg(child) {
                    config.host = host;
                }
            }
            "port" => {
                if let Some(port) = get_first_int_arg(child) {
                    config.port = u16::try_from(port).map_err(|_| ConfigError::InvalidValue {
                        field: "server.port".to_string(),
                        message: format!("{} is not a valid port", port),
                    })?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_storage(node: &KdlNode, config: &mut SystemConfig) {
    for child in child_nodes(node) {
        match child.name().value() {
            "ledger" => {
                if let Some(path) = get_first_string_arg(child) {
                    config.ledger_path = PathBuf::from(path);
                }
            }
            "results" => {
                if let Some(path) = get_first_string_arg(child) {
                    config.results_dir = PathBuf::from(path);
                }
            }
            _ => {}
        }
    }
}

fn parse_worker(node: &KdlNode, config: &mut SystemConfig) -> ConfigResult<()> {
    for child in child_nodes(node) {
        if child.name().value() == "delay-ms" {
            if let Some(ms) = get_first_int_arg(child) {
                let ms = u64::try_from(ms).map_err(|_| ConfigError::InvalidValue {
                    field: "worker.delay-ms".to_string(),
                    message: format!("{} is not a valid duration", ms),
                })?;
                config.execution_delay = Duration::from_millis(ms);
            }
        }
    }
    Ok(())
}

fn parse_logging(node: &KdlNode, config: &mut SystemConfig) -> ConfigResult<()> {
    for child in child_nodes(node) {
        if child.name().value() == "format" {
            config.log_format = match get_first_string_arg(child).as_deref() {
                Some("pretty") | None => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(ConfigError::InvalidValue {
                        field: "logging.format".to_string(),
                        message: format!("unknown log format: {}", other),
                    });
                }
            };
        }
    }
    Ok(())
}

fn child_nodes(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|c| c.nodes().iter())
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_first_int_arg(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}
