//! Configuration validation.

use std::collections::HashSet;

use url::Url;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::schema::Config;

/// Timeouts above this are accepted but flagged.
const LONG_TIMEOUT_SECS: u64 = 3600;

/// Node capacities above this are accepted but flagged.
const LARGE_CAPACITY: usize = 64;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next().map(|error| ConfigError::InvalidValue {
            field: error.path,
            message: error.message,
        })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_distributor(config, &mut result);
        Self::validate_node(config, &mut result);
        Self::validate_static_nodes(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.max_body_bytes == 0 {
            result.add_error(ValidationError::new(
                "server.max_body_bytes",
                "max_body_bytes must be greater than 0",
            ));
        }
    }

    fn validate_distributor(config: &Config, result: &mut ValidationResult) {
        let distributor = &config.distributor;
        for (path, secs) in [
            ("distributor.session_timeout_secs", distributor.session_timeout_secs),
            ("distributor.command_timeout_secs", distributor.command_timeout_secs),
            ("distributor.stop_timeout_secs", distributor.stop_timeout_secs),
        ] {
            if secs == 0 {
                result.add_error(ValidationError::new(path, "Timeout must be greater than 0"));
            } else if secs > LONG_TIMEOUT_SECS {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("Timeout is very long (>{}s), stuck nodes will hold clients", LONG_TIMEOUT_SECS),
                ));
            }
        }

        Self::check_capacity(
            "distributor.default_node_capacity",
            Some(distributor.default_node_capacity),
            result,
        );
    }

    fn validate_node(config: &Config, result: &mut ValidationResult) {
        Self::check_capacity("node.max_sessions", config.node.max_sessions, result);

        for (index, driver) in config.node.drivers.iter().enumerate() {
            let path = format!("node.drivers[{}]", index);
            Self::check_http_url(&format!("{}.url", path), &driver.url, result);
            if driver.stereotype.is_empty() {
                result.add_warning(ValidationWarning::new(
                    format!("{}.stereotype", path),
                    "Empty stereotype matches only requests without constraints",
                ));
            }
        }
    }

    fn validate_static_nodes(config: &Config, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (index, node) in config.nodes.iter().enumerate() {
            let path = format!("nodes[{}]", index);
            Self::check_http_url(&format!("{}.uri", path), &node.uri, result);
            Self::check_capacity(&format!("{}.max_sessions", path), node.max_sessions, result);

            if let Some(ref id) = node.id {
                match Uuid::parse_str(id) {
                    Ok(uuid) if !seen.insert(uuid) => result.add_error(ValidationError::new(
                        format!("{}.id", path),
                        format!("Duplicate node id '{}'", id),
                    )),
                    Ok(_) => {}
                    Err(_) => result.add_error(ValidationError::new(
                        format!("{}.id", path),
                        format!("Node id '{}' is not a UUID", id),
                    )),
                }
            }

            if node.capabilities.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.capabilities", path),
                    "Node must advertise at least one capability stereotype",
                ));
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }

    fn check_capacity(path: &str, capacity: Option<usize>, result: &mut ValidationResult) {
        match capacity {
            Some(0) => result.add_error(ValidationError::new(path, "Capacity must be greater than 0")),
            Some(capacity) if capacity > LARGE_CAPACITY => result.add_warning(ValidationWarning::new(
                path,
                format!("Capacity {} is unusually high (>{})", capacity, LARGE_CAPACITY),
            )),
            _ => {}
        }
    }

    fn check_http_url(path: &str, value: &str, result: &mut ValidationResult) {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => result.add_error(ValidationError::new(
                path,
                "URL must start with http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(path, format!("Invalid URL '{}': {}", value, e))),
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
