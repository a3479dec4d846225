use super::*;

use webgrid_config::{ConfigLoader, DriverConfig, StaticNodeConfig};
use webgrid_protocols::NodeState;

fn config(toml: &str) -> Config {
    ConfigLoader::load_str(toml).unwrap()
}

#[test]
fn test_build_state_applies_timeouts() {
    let config = config(
        r#"
        [distributor]
        command_timeout_secs = 42
        stop_timeout_secs = 7
        default_node_capacity = 3
        "#,
    );
    assert_eq!(config.distributor.stop_timeout(), Duration::from_secs(7));
    let state = build_state(&config).unwrap();

    assert_eq!(state.settings.command_timeout, Duration::from_secs(42));
    assert_eq!(state.settings.default_node_capacity, 3);
    assert!(state.nodes().is_empty());
    assert!(state.sessions().is_empty());
}

#[test]
fn test_register_static_nodes() {
    let config = config(
        r#"
        [distributor]
        default_node_capacity = 2

        [[nodes]]
        id = "6f1c3f5e-2a8b-4d55-9f1e-0c0d5a1b2c3d"
        uri = "http://10.0.0.5:5555"
        capabilities = [{ browserName = "chrome" }]
        max_sessions = 5

        [[nodes]]
        uri = "http://10.0.0.6:5555"
        capabilities = [{ browserName = "firefox" }]
        "#,
    );
    let state = build_state(&config).unwrap();

    let added = register_static_nodes(&state, &config).unwrap();
    assert_eq!(added, 2);
    assert_eq!(state.nodes().len(), 2);

    let id: NodeId = "6f1c3f5e-2a8b-4d55-9f1e-0c0d5a1b2c3d".parse().unwrap();
    let node = state.nodes().get(id).unwrap();
    assert_eq!(node.max_sessions(), 5);
    assert_eq!(node.uri().as_str(), "http://10.0.0.5:5555/");
    assert_eq!(state.nodes().state(id), Some(NodeState::Active));

    let status = state.distributor.status();
    let firefox = status.nodes.iter().find(|n| n.id != id).unwrap();
    assert_eq!(firefox.capacity, 2);
}

#[test]
fn test_register_static_nodes_rejects_bad_uri() {
    let mut config = Config::default();
    config.nodes.push(StaticNodeConfig {
        id: None,
        uri: "not a url".to_string(),
        capabilities: Vec::new(),
        max_sessions: None,
    });
    let state = build_state(&config).unwrap();

    let err = register_static_nodes(&state, &config).unwrap_err();
    match err {
        ConfigError::InvalidValue { field, .. } => assert_eq!(field, "nodes[0].uri"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_register_static_nodes_rejects_missing_capabilities() {
    let mut config = Config::default();
    config.nodes.push(StaticNodeConfig {
        id: None,
        uri: "http://10.0.0.5:5555".to_string(),
        capabilities: Vec::new(),
        max_sessions: None,
    });
    let state = build_state(&config).unwrap();

    let err = register_static_nodes(&state, &config).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "nodes[0].capabilities"));
    assert!(state.nodes().is_empty());
}

#[test]
fn test_register_static_nodes_rejects_duplicate_id() {
    let entry = StaticNodeConfig {
        id: Some("6f1c3f5e-2a8b-4d55-9f1e-0c0d5a1b2c3d".to_string()),
        uri: "http://10.0.0.5:5555".to_string(),
        capabilities: vec![[("browserName".to_string(), "chrome".into())].into()],
        max_sessions: None,
    };
    let mut config = Config::default();
    config.nodes.push(entry.clone());
    config.nodes.push(entry);
    let state = build_state(&config).unwrap();

    let err = register_static_nodes(&state, &config).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "nodes[1].id"));
    assert_eq!(state.nodes().len(), 1);
}

#[test]
fn test_build_local_node_from_drivers() {
    let mut config = Config::default();
    config.server.port = 4545;
    config.node.max_sessions = Some(2);
    let mut stereotype = CapabilityTable::new();
    stereotype.insert("browserName".to_string(), "chrome".into());
    config.node.drivers.push(DriverConfig {
        url: "http://127.0.0.1:9515".to_string(),
        stereotype,
    });

    let node = build_local_node(&config).unwrap();
    assert_eq!(node.max_sessions(), 2);
    assert_eq!(node.uri().as_str(), "http://localhost:4545/");
    assert_eq!(node.stereotypes().len(), 1);
    assert_eq!(node.stereotypes()[0].browser_name(), Some("chrome"));
}

#[test]
fn test_build_local_node_without_drivers() {
    let config = Config::default();

    let node = build_local_node(&config).unwrap();
    assert!(node.stereotypes().is_empty());
    assert_eq!(node.max_sessions(), default_max_sessions());
}

#[test]
fn test_build_local_node_rejects_bad_driver_url() {
    let mut config = Config::default();
    config.node.drivers.push(DriverConfig {
        url: "::".to_string(),
        stereotype: CapabilityTable::new(),
    });

    let err = build_local_node(&config).unwrap_err();
    assert!(err.to_string().contains("node.drivers[0].url"));
}
