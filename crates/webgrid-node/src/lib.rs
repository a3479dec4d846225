//! # WebGrid Node
//!
//! Implementations of the [`Node`](webgrid_protocols::Node) handle.
//!
//! ## Components
//!
//! - [`WebDriverClient`] - HTTP client for one WebDriver endpoint
//! - [`RemoteNode`] - A node process reachable over the network
//! - [`LocalNode`] - An in-process node delegating to [`SessionRunner`]s
//! - [`DriverServiceRunner`] - Runner backed by a local WebDriver service

pub mod client;
pub mod driver;
pub mod local;
pub mod remote;

pub use client::WebDriverClient;
pub use driver::DriverServiceRunner;
pub use local::{LocalNode, SessionRunner, default_max_sessions};
pub use remote::RemoteNode;
