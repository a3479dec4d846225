//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A capability set as written in the config file.
pub type CapabilityTable = BTreeMap<String, serde_json::Value>;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub distributor: DistributorConfig,

    /// The in-process node used in standalone mode.
    #[serde(default)]
    pub node: NodeConfig,

    /// Remote nodes registered at startup.
    #[serde(default)]
    pub nodes: Vec<StaticNodeConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Host name other machines use to reach this process. Falls back to
    /// `host`.
    #[serde(default)]
    pub advertised_host: Option<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Base URL under which this process is reachable.
    pub fn advertised_url(&self) -> String {
        let host = self.advertised_host.as_deref().unwrap_or(match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            host => host,
        });
        format!("http://{}:{}", host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            advertised_host: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4444
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

/// Scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// How long a node may take to create a session.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,

    /// How long a node may take to answer a forwarded command.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// How long a node may take to terminate a session.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Capacity for nodes that register without `maxSessions`.
    #[serde(default = "default_node_capacity")]
    pub default_node_capacity: usize,
}

impl DistributorConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: default_session_timeout(),
            command_timeout_secs: default_command_timeout(),
            stop_timeout_secs: default_stop_timeout(),
            default_node_capacity: default_node_capacity(),
        }
    }
}

fn default_session_timeout() -> u64 {
    300
}

fn default_command_timeout() -> u64 {
    180
}

fn default_stop_timeout() -> u64 {
    60
}

fn default_node_capacity() -> usize {
    1
}

/// Local node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Concurrent sessions; three per CPU when unset.
    #[serde(default)]
    pub max_sessions: Option<usize>,

    #[serde(default)]
    pub drivers: Vec<DriverConfig>,
}

/// A WebDriver service already running on this machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub url: String,

    /// Capabilities the service can satisfy, e.g. `{ browserName = "chrome" }`.
    #[serde(default)]
    pub stereotype: CapabilityTable,
}

/// A remote node known at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticNodeConfig {
    /// UUID of the node; generated when absent.
    #[serde(default)]
    pub id: Option<String>,

    pub uri: String,

    #[serde(default)]
    pub capabilities: Vec<CapabilityTable>,

    #[serde(default)]
    pub max_sessions: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Directory for daily rotated log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
