//! Grid assembly: registries, distributor and the nodes known at startup.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use webgrid_api::{AppState, GridSettings};
use webgrid_config::{CapabilityTable, Config, ConfigError};
use webgrid_core::{Distributor, NodeRegistry, SessionRegistry};
use webgrid_node::{DriverServiceRunner, LocalNode, RemoteNode, default_max_sessions};
use webgrid_protocols::{Capabilities, Node, NodeId};

/// Upper bound for a TCP connect to a node.
const NODE_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared state from configuration. No node is registered yet.
pub(crate) fn build_state(config: &Config) -> Result<Arc<AppState>, ConfigError> {
    let distributor = Distributor::new(
        Arc::new(NodeRegistry::new()),
        Arc::new(SessionRegistry::new()),
        webgrid_core::DistributorConfig {
            session_timeout: config.distributor.session_timeout(),
            stop_timeout: config.distributor.stop_timeout(),
        },
    );
    let settings = GridSettings {
        command_timeout: config.distributor.command_timeout(),
        default_node_capacity: config.distributor.default_node_capacity,
    };
    let node_client = reqwest::Client::builder()
        .connect_timeout(NODE_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| invalid("distributor", e.to_string()))?;

    Ok(Arc::new(
        AppState::new(Arc::new(distributor), settings).with_node_client(node_client),
    ))
}

/// Register every `[[nodes]]` entry. Returns how many were added.
pub(crate) fn register_static_nodes(state: &AppState, config: &Config) -> Result<usize, ConfigError> {
    for (index, entry) in config.nodes.iter().enumerate() {
        let field = format!("nodes[{}]", index);
        let id = match entry.id {
            Some(ref id) => id
                .parse::<NodeId>()
                .map_err(|e| invalid(&format!("{}.id", field), e.to_string()))?,
            None => NodeId::random(),
        };
        let uri = parse_url(&format!("{}.uri", field), &entry.uri)?;
        if entry.capabilities.is_empty() {
            return Err(invalid(
                &format!("{}.capabilities", field),
                "node must advertise at least one capability stereotype".to_string(),
            ));
        }
        let capacity = entry
            .max_sessions
            .unwrap_or(config.distributor.default_node_capacity);
        let stereotypes = entry.capabilities.iter().map(to_capabilities).collect();

        let node = RemoteNode::new(id, uri.clone(), stereotypes, capacity)
            .with_http_client(state.node_client.clone());
        state
            .distributor
            .add(Arc::new(node))
            .map_err(|e| invalid(&format!("{}.id", field), e.to_string()))?;
        info!(node = %id, uri = %uri, capacity, "Registered static node");
    }
    Ok(config.nodes.len())
}

/// The in-process node for standalone mode, served by `[[node.drivers]]`.
pub(crate) fn build_local_node(config: &Config) -> Result<LocalNode, ConfigError> {
    let uri = parse_url("server.advertised_host", &config.server.advertised_url())?;
    let capacity = config.node.max_sessions.unwrap_or_else(default_max_sessions);
    let mut node = LocalNode::new(uri, capacity);

    for (index, driver) in config.node.drivers.iter().enumerate() {
        let url = parse_url(&format!("node.drivers[{}].url", index), &driver.url)?;
        node = node.with_slot(
            to_capabilities(&driver.stereotype),
            Arc::new(DriverServiceRunner::new(url)),
        );
    }
    if node.stereotypes().is_empty() {
        warn!("Standalone node has no drivers configured and will not accept sessions");
    }
    Ok(node)
}

fn to_capabilities(table: &CapabilityTable) -> Capabilities {
    Capabilities::from(table.clone())
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| invalid(field, format!("'{}': {}", value, e)))
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
