//! Node lifecycle state and status snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::capabilities::Capabilities;
use super::ids::NodeId;

/// Lifecycle state of a registered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    /// Accepts new sessions.
    Active,
    /// Rejects new sessions; existing sessions run to completion.
    Draining,
    /// Gone. Never selected again.
    Removed,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Draining => "draining",
            Self::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of one node, as reported by `/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub id: NodeId,
    pub uri: Url,
    pub state: NodeState,
    pub load: usize,
    pub capacity: usize,
    pub stereotypes: Vec<Capabilities>,
}

impl NodeStatus {
    pub fn has_free_slot(&self) -> bool {
        self.state == NodeState::Active && self.load < self.capacity
    }
}

/// Grid-wide status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStatus {
    /// True when at least one node can accept a new session right now.
    pub ready: bool,
    pub nodes: Vec<NodeStatus>,
}

impl GridStatus {
    pub fn from_nodes(nodes: Vec<NodeStatus>) -> Self {
        Self {
            ready: nodes.iter().any(NodeStatus::has_free_slot),
            nodes,
        }
    }

    pub fn message(&self) -> &'static str {
        if self.ready {
            "Grid ready."
        } else {
            "Grid not ready."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: NodeState, load: usize, capacity: usize) -> NodeStatus {
        NodeStatus {
            id: NodeId::random(),
            uri: Url::parse("http://node:5555").unwrap(),
            state,
            load,
            capacity,
            stereotypes: Vec::new(),
        }
    }

    #[test]
    fn test_free_slot_requires_active_and_headroom() {
        assert!(status(NodeState::Active, 0, 1).has_free_slot());
        assert!(!status(NodeState::Active, 1, 1).has_free_slot());
        assert!(!status(NodeState::Draining, 0, 1).has_free_slot());
        assert!(!status(NodeState::Removed, 0, 1).has_free_slot());
    }

    #[test]
    fn test_grid_ready_when_any_node_has_room() {
        let grid = GridStatus::from_nodes(vec![
            status(NodeState::Active, 2, 2),
            status(NodeState::Draining, 0, 4),
        ]);
        assert!(!grid.ready);

        let grid = GridStatus::from_nodes(vec![
            status(NodeState::Active, 2, 2),
            status(NodeState::Active, 0, 1),
        ]);
        assert!(grid.ready);
        assert_eq!(grid.message(), "Grid ready.");
    }

    #[test]
    fn test_empty_grid_is_not_ready() {
        assert!(!GridStatus::from_nodes(Vec::new()).ready);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_string(&NodeState::Draining).unwrap(), "\"DRAINING\"");
        assert_eq!(NodeState::Active.to_string(), "active");
    }
}
