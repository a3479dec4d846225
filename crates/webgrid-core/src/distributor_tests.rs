use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use url::Url;
use webgrid_protocols::{CreatedSession, GridRequest, GridResponse, RegistryError};

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Hang,
}

struct ScriptedNode {
    id: NodeId,
    uri: Url,
    stereotypes: Vec<Capabilities>,
    capacity: usize,
    behavior: Behavior,
    fail_stop: bool,
    created: AtomicUsize,
    stopped: AtomicUsize,
}

impl ScriptedNode {
    fn new(browser: &str, capacity: usize, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::random(),
            uri: Url::parse("http://node:5555").unwrap(),
            stereotypes: vec![Capabilities::new().with("browserName", browser)],
            capacity,
            behavior,
            fail_stop: false,
            created: AtomicUsize::new(0),
            stopped: AtomicUsize::new(0),
        })
    }

    fn failing_stop(browser: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_stop: true,
            ..Arc::into_inner(Self::new(browser, 1, Behavior::Succeed)).unwrap()
        })
    }
}

#[async_trait]
impl Node for ScriptedNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    fn stereotypes(&self) -> &[Capabilities] {
        &self.stereotypes
    }

    fn max_sessions(&self) -> usize {
        self.capacity
    }

    async fn new_session(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        match self.behavior {
            Behavior::Succeed => {
                self.created.fetch_add(1, Ordering::SeqCst);
                // Give other tasks a chance to race for the same slot.
                tokio::task::yield_now().await;
                Ok(CreatedSession {
                    id: SessionId::random(),
                    capabilities: capabilities.clone(),
                })
            }
            Behavior::Fail => Err(NodeError::Rejected {
                status: 500,
                message: "browser crashed".to_string(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(NodeError::Custom("unreachable".to_string()))
            }
        }
    }

    async fn execute(&self, _request: GridRequest) -> Result<GridResponse, NodeError> {
        Err(NodeError::Custom("not used".to_string()))
    }

    async fn stop_session(&self, _session_id: &SessionId) -> Result<(), NodeError> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(NodeError::Unreachable("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Holds `new_session` until the gate opens, then succeeds or fails.
struct GatedNode {
    id: NodeId,
    uri: Url,
    stereotypes: Vec<Capabilities>,
    succeed: bool,
    entered: tokio::sync::Notify,
    gate: tokio::sync::Notify,
    stopped: AtomicUsize,
}

impl GatedNode {
    fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            id: NodeId::random(),
            uri: Url::parse("http://old-node:5555").unwrap(),
            stereotypes: vec![Capabilities::new().with("browserName", "chrome")],
            succeed,
            entered: tokio::sync::Notify::new(),
            gate: tokio::sync::Notify::new(),
            stopped: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Node for GatedNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    fn stereotypes(&self) -> &[Capabilities] {
        &self.stereotypes
    }

    fn max_sessions(&self) -> usize {
        1
    }

    async fn new_session(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        self.entered.notify_one();
        self.gate.notified().await;
        if !self.succeed {
            return Err(NodeError::Unreachable("node went away".to_string()));
        }
        Ok(CreatedSession {
            id: SessionId::new("late-session"),
            capabilities: capabilities.clone(),
        })
    }

    async fn execute(&self, _request: GridRequest) -> Result<GridResponse, NodeError> {
        Err(NodeError::Custom("not used".to_string()))
    }

    async fn stop_session(&self, _session_id: &SessionId) -> Result<(), NodeError> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A healthy node registered under an existing id.
fn replacement_for(id: NodeId) -> Arc<ScriptedNode> {
    Arc::new(ScriptedNode {
        id,
        ..Arc::into_inner(ScriptedNode::new("chrome", 1, Behavior::Succeed)).unwrap()
    })
}

fn distributor() -> Distributor {
    Distributor::new(
        Arc::new(NodeRegistry::new()),
        Arc::new(SessionRegistry::new()),
        DistributorConfig {
            session_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        },
    )
}

fn chrome() -> CapabilityRequest {
    CapabilityRequest::single(Capabilities::new().with("browserName", "chrome"))
}

#[tokio::test]
async fn test_no_nodes_is_no_matching_node() {
    let distributor = distributor();
    let err = distributor.new_session(&chrome()).await.unwrap_err();
    assert!(matches!(err, DistributorError::NoMatchingNode));
}

#[tokio::test]
async fn test_unsupported_browser_is_no_matching_node() {
    let distributor = distributor();
    distributor.add(ScriptedNode::new("firefox", 1, Behavior::Succeed)).unwrap();
    let err = distributor.new_session(&chrome()).await.unwrap_err();
    assert!(matches!(err, DistributorError::NoMatchingNode));
}

#[tokio::test]
async fn test_new_session_binds_and_reserves() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();

    let session = distributor.new_session(&chrome()).await.unwrap();
    assert_eq!(session.node_id, node.id);
    assert_eq!(session.capabilities.browser_name(), Some("chrome"));
    assert_eq!(distributor.nodes().load(node.id), Some(1));

    let binding = distributor.sessions().lookup(&session.session_id).unwrap();
    assert_eq!(binding.node.id(), node.id);
}

#[tokio::test]
async fn test_full_node_is_session_not_created() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();

    distributor.new_session(&chrome()).await.unwrap();
    let err = distributor.new_session(&chrome()).await.unwrap_err();
    assert!(matches!(err, DistributorError::SessionNotCreated(_)));
    assert_eq!(distributor.nodes().load(node.id), Some(1));
    assert_eq!(node.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_candidate_is_skipped_and_released() {
    let distributor = distributor();
    let broken = ScriptedNode::new("chrome", 1, Behavior::Fail);
    let healthy = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(broken.clone()).unwrap();
    distributor.add(healthy.clone()).unwrap();

    let session = distributor.new_session(&chrome()).await.unwrap();
    assert_eq!(session.node_id, healthy.id);
    assert_eq!(distributor.nodes().load(broken.id), Some(0));
    assert_eq!(distributor.nodes().load(healthy.id), Some(1));
}

#[tokio::test]
async fn test_all_candidates_failing_reports_last_cause() {
    let distributor = distributor();
    distributor.add(ScriptedNode::new("chrome", 1, Behavior::Fail)).unwrap();

    let err = distributor.new_session(&chrome()).await.unwrap_err();
    match err {
        DistributorError::SessionNotCreated(cause) => assert!(cause.contains("browser crashed")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(distributor.sessions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_creation_timeout_skips_candidate() {
    let distributor = distributor();
    let stuck = ScriptedNode::new("chrome", 1, Behavior::Hang);
    distributor.add(stuck.clone()).unwrap();

    let err = distributor.new_session(&chrome()).await.unwrap_err();
    match err {
        DistributorError::SessionNotCreated(cause) => assert!(cause.contains("timed out")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(distributor.nodes().load(stuck.id), Some(0));
}

#[tokio::test]
async fn test_first_satisfiable_alternative_wins() {
    let distributor = distributor();
    let firefox = ScriptedNode::new("firefox", 1, Behavior::Succeed);
    let chrome_node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(firefox.clone()).unwrap();
    distributor.add(chrome_node.clone()).unwrap();

    let request = CapabilityRequest::new(vec![
        Capabilities::new().with("browserName", "safari"),
        Capabilities::new().with("browserName", "chrome"),
        Capabilities::new().with("browserName", "firefox"),
    ]);
    let session = distributor.new_session(&request).await.unwrap();
    assert_eq!(session.node_id, chrome_node.id);
}

#[tokio::test]
async fn test_sessions_spread_to_least_loaded_node() {
    let distributor = distributor();
    let a = ScriptedNode::new("chrome", 3, Behavior::Succeed);
    let b = ScriptedNode::new("chrome", 3, Behavior::Succeed);
    distributor.add(a.clone()).unwrap();
    distributor.add(b.clone()).unwrap();

    let first = distributor.new_session(&chrome()).await.unwrap();
    let second = distributor.new_session(&chrome()).await.unwrap();
    assert_ne!(first.node_id, second.node_id);
    assert_eq!(distributor.nodes().load(a.id), Some(1));
    assert_eq!(distributor.nodes().load(b.id), Some(1));

    distributor.end_session(&first.session_id).await.unwrap();
    let third = distributor.new_session(&chrome()).await.unwrap();
    assert_eq!(third.node_id, first.node_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overbook() {
    let distributor = Arc::new(distributor());
    let node = ScriptedNode::new("chrome", 3, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();

    let attempts = (0..16).map(|_| {
        let distributor = distributor.clone();
        tokio::spawn(async move { distributor.new_session(&chrome()).await })
    });
    let results = futures::future::join_all(attempts).await;

    let successes = results
        .iter()
        .filter(|result| matches!(result, Ok(Ok(_))))
        .count();
    let rejections = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Ok(Err(DistributorError::SessionNotCreated(_) | DistributorError::NoMatchingNode))
            )
        })
        .count();
    assert_eq!(successes, 3);
    assert_eq!(rejections, 13);
    assert_eq!(distributor.nodes().load(node.id), Some(3));
    assert_eq!(distributor.sessions().count_for(node.id), 3);
}

#[tokio::test]
async fn test_end_session_releases_even_when_node_fails() {
    let distributor = distributor();
    let node = ScriptedNode::failing_stop("chrome");
    distributor.add(node.clone()).unwrap();

    let session = distributor.new_session(&chrome()).await.unwrap();
    distributor.end_session(&session.session_id).await.unwrap();

    assert_eq!(node.stopped.load(Ordering::SeqCst), 1);
    assert_eq!(distributor.nodes().load(node.id), Some(0));
    assert!(distributor.sessions().lookup(&session.session_id).is_err());
}

#[tokio::test]
async fn test_end_unknown_session() {
    let distributor = distributor();
    let err = distributor.end_session(&SessionId::new("nope")).await.unwrap_err();
    assert!(matches!(err, DistributorError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_session_ended_by_node() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();

    let session = distributor.new_session(&chrome()).await.unwrap();
    distributor.session_ended(&session.session_id).unwrap();

    assert_eq!(node.stopped.load(Ordering::SeqCst), 0);
    assert_eq!(distributor.nodes().load(node.id), Some(0));
    assert!(distributor.session_ended(&session.session_id).is_err());
}

#[tokio::test]
async fn test_duplicate_node() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();
    let err = distributor.add(node.clone()).unwrap_err();
    assert!(matches!(err, DistributorError::DuplicateNode(id) if id == node.id));
}

#[tokio::test]
async fn test_draining_node_finishes_sessions_then_disappears() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 2, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();
    let session = distributor.new_session(&chrome()).await.unwrap();

    assert_eq!(distributor.remove(node.id, false), NodeState::Draining);
    assert!(distributor.sessions().lookup(&session.session_id).is_ok());

    let err = distributor.new_session(&chrome()).await.unwrap_err();
    assert!(matches!(err, DistributorError::SessionNotCreated(_)));

    distributor.end_session(&session.session_id).await.unwrap();
    assert!(distributor.nodes().get(node.id).is_none());
}

#[tokio::test]
async fn test_forced_removal_orphans_sessions() {
    let distributor = distributor();
    let node = ScriptedNode::new("chrome", 2, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();
    let session = distributor.new_session(&chrome()).await.unwrap();

    assert_eq!(distributor.remove(node.id, true), NodeState::Removed);
    assert!(matches!(
        distributor.sessions().lookup(&session.session_id),
        Err(RegistryError::SessionNotFound(_))
    ));
    assert!(distributor.nodes().is_empty());
    assert_eq!(node.stopped.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_status_reports_readiness() {
    let distributor = distributor();
    assert!(!distributor.status().ready);

    let node = ScriptedNode::new("chrome", 1, Behavior::Succeed);
    distributor.add(node.clone()).unwrap();
    assert!(distributor.status().ready);

    distributor.new_session(&chrome()).await.unwrap();
    let status = distributor.status();
    assert!(!status.ready);
    assert_eq!(status.nodes[0].load, 1);
}

#[tokio::test]
async fn test_failed_creation_on_removed_node_keeps_replacement_load() {
    let distributor = Arc::new(distributor());
    let old = GatedNode::new(false);
    distributor.add(old.clone()).unwrap();

    let pending = {
        let distributor = distributor.clone();
        tokio::spawn(async move { distributor.new_session(&chrome()).await })
    };
    old.entered.notified().await;
    assert_eq!(distributor.nodes().load(old.id), Some(1));

    distributor.remove(old.id, true);
    distributor.add(replacement_for(old.id)).unwrap();
    let current = distributor.new_session(&chrome()).await.unwrap();
    assert_eq!(distributor.nodes().load(old.id), Some(1));

    old.gate.notify_one();
    assert!(pending.await.unwrap().is_err());

    assert_eq!(distributor.nodes().load(old.id), Some(1));
    assert_eq!(distributor.sessions().count_for(old.id), 1);
    let err = distributor.new_session(&chrome()).await.unwrap_err();
    assert!(matches!(err, DistributorError::SessionNotCreated(_)));
    assert!(distributor.sessions().lookup(&current.session_id).is_ok());
}

#[tokio::test]
async fn test_late_session_on_removed_node_is_discarded() {
    let distributor = Arc::new(distributor());
    let old = GatedNode::new(true);
    distributor.add(old.clone()).unwrap();

    let pending = {
        let distributor = distributor.clone();
        tokio::spawn(async move { distributor.new_session(&chrome()).await })
    };
    old.entered.notified().await;

    distributor.remove(old.id, true);
    distributor.add(replacement_for(old.id)).unwrap();
    let current = distributor.new_session(&chrome()).await.unwrap();

    old.gate.notify_one();
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, DistributorError::SessionNotCreated(_)));
    assert_eq!(old.stopped.load(Ordering::SeqCst), 1);
    assert!(distributor.sessions().lookup(&SessionId::new("late-session")).is_err());

    // The replacement still carries exactly its own session.
    assert_eq!(distributor.nodes().load(old.id), Some(1));
    assert_eq!(distributor.sessions().count_for(old.id), 1);

    distributor.end_session(&current.session_id).await.unwrap();
    assert_eq!(distributor.nodes().load(old.id), Some(0));
}
