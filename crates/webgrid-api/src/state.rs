//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use webgrid_core::{Distributor, DistributorConfig, NodeRegistry, SessionRegistry};

/// Request handling limits and defaults.
#[derive(Debug, Clone)]
pub struct GridSettings {
    /// Upper bound for a node to answer a forwarded command.
    pub command_timeout: Duration,
    /// Capacity for nodes that register without `maxSessions`.
    pub default_node_capacity: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(180),
            default_node_capacity: 1,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub distributor: Arc<Distributor>,
    pub settings: GridSettings,
    /// Shared client for nodes registered over HTTP.
    pub node_client: reqwest::Client,
    start_time: Instant,
}

impl AppState {
    pub fn new(distributor: Arc<Distributor>, settings: GridSettings) -> Self {
        Self {
            distributor,
            settings,
            node_client: reqwest::Client::new(),
            start_time: Instant::now(),
        }
    }

    pub fn with_node_client(mut self, client: reqwest::Client) -> Self {
        self.node_client = client;
        self
    }

    pub fn nodes(&self) -> &Arc<NodeRegistry> {
        self.distributor.nodes()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        self.distributor.sessions()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for AppState {
    fn default() -> Self {
        let distributor = Distributor::new(
            Arc::new(NodeRegistry::new()),
            Arc::new(SessionRegistry::new()),
            DistributorConfig::default(),
        );
        Self::new(Arc::new(distributor), GridSettings::default())
    }
}
