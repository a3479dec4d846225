use super::*;
use crate::registry::{NodeRegistry, Reservation};
use async_trait::async_trait;
use chrono::Utc;
use url::Url;
use webgrid_protocols::{Capabilities, CreatedSession, GridRequest, GridResponse, NodeError};

struct StubNode {
    id: NodeId,
    uri: Url,
}

impl StubNode {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::random(),
            uri: Url::parse("http://node:5555").unwrap(),
        })
    }
}

#[async_trait]
impl Node for StubNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    fn stereotypes(&self) -> &[Capabilities] {
        &[]
    }

    fn max_sessions(&self) -> usize {
        4
    }

    async fn new_session(&self, _capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        Err(NodeError::Custom("not used".to_string()))
    }

    async fn execute(&self, _request: GridRequest) -> Result<GridResponse, NodeError> {
        Err(NodeError::Custom("not used".to_string()))
    }

    async fn stop_session(&self, _session_id: &SessionId) -> Result<(), NodeError> {
        Ok(())
    }
}

fn session_on(node: &StubNode, id: &str) -> Session {
    Session {
        session_id: SessionId::new(id),
        node_id: node.id,
        uri: node.uri.clone(),
        capabilities: Capabilities::new().with("browserName", "chrome"),
        start_time: Utc::now(),
    }
}

/// Take a slot on `node`, registering it on first use.
fn slot_on(nodes: &NodeRegistry, node: &Arc<StubNode>) -> Reservation {
    if nodes.get(node.id).is_none() {
        nodes.add(node.clone()).unwrap();
    }
    nodes.reserve(node.id).unwrap()
}

#[test]
fn test_bind_and_lookup() {
    let registry = SessionRegistry::new();
    let nodes = NodeRegistry::new();
    let node = StubNode::new();
    registry.bind(session_on(&node, "s1"), slot_on(&nodes, &node)).unwrap();

    let binding = registry.lookup(&SessionId::new("s1")).unwrap();
    assert_eq!(binding.session.node_id, node.id);
    assert_eq!(binding.node.id(), node.id);
    assert_eq!(binding.reservation.node_id(), node.id);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lookup_miss() {
    let registry = SessionRegistry::new();
    let err = registry.lookup(&SessionId::new("missing")).err().unwrap();
    assert!(matches!(err, RegistryError::SessionNotFound(id) if id.as_str() == "missing"));
}

#[test]
fn test_rebinding_is_rejected() {
    let registry = SessionRegistry::new();
    let nodes = NodeRegistry::new();
    let first = StubNode::new();
    let second = StubNode::new();
    registry.bind(session_on(&first, "s1"), slot_on(&nodes, &first)).unwrap();

    let err = registry.bind(session_on(&second, "s1"), slot_on(&nodes, &second)).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateSession(_)));
    assert_eq!(registry.lookup(&SessionId::new("s1")).unwrap().session.node_id, first.id);
}

#[test]
fn test_unbind() {
    let registry = SessionRegistry::new();
    let nodes = NodeRegistry::new();
    let node = StubNode::new();
    registry.bind(session_on(&node, "s1"), slot_on(&nodes, &node)).unwrap();

    let removed = registry.unbind(&SessionId::new("s1")).unwrap();
    assert_eq!(removed.session.session_id.as_str(), "s1");
    assert!(registry.is_empty());
    assert!(registry.unbind(&SessionId::new("s1")).is_err());
}

#[test]
fn test_unbind_node_only_touches_that_node() {
    let registry = SessionRegistry::new();
    let nodes = NodeRegistry::new();
    let doomed = StubNode::new();
    let healthy = StubNode::new();
    registry.bind(session_on(&doomed, "a"), slot_on(&nodes, &doomed)).unwrap();
    registry.bind(session_on(&doomed, "b"), slot_on(&nodes, &doomed)).unwrap();
    registry.bind(session_on(&healthy, "c"), slot_on(&nodes, &healthy)).unwrap();

    let mut orphaned = registry.unbind_node(doomed.id);
    orphaned.sort();
    assert_eq!(orphaned, vec![SessionId::new("a"), SessionId::new("b")]);
    assert_eq!(registry.count_for(doomed.id), 0);
    assert_eq!(registry.count_for(healthy.id), 1);
    assert_eq!(registry.list().len(), 1);
}
