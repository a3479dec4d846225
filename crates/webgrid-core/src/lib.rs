//! # WebGrid Core
//!
//! Scheduling core of the grid coordinator.
//!
//! ## Components
//!
//! - [`matcher`] - Pure capability matching
//! - [`NodeRegistry`] - Registered nodes, their load and lifecycle state
//! - [`SessionRegistry`] - Session to node bindings
//! - [`Distributor`] - Places new sessions on nodes and tracks their lifetime
//!
//! The registries are the only shared mutable structures. Every mutation goes
//! through their atomic operations; the distributor only keeps transient
//! bookkeeping for the scheduling attempt in progress.

pub mod distributor;
pub mod matcher;
pub mod registry;

pub use distributor::{Distributor, DistributorConfig};
pub use registry::{Candidate, NodeRegistry, Reservation, SessionBinding, SessionRegistry};
