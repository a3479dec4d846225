//! # WebGrid Protocols
//!
//! Shared definitions for the WebGrid coordinator.
//! Contains types, traits and the error taxonomy - no scheduling logic.
//!
//! ## Core Items
//!
//! - [`Node`] - Client-side handle to a worker able to run browser sessions
//! - [`Capabilities`] / [`CapabilityRequest`] - What a client asks for and what a node offers
//! - [`GridRequest`] / [`GridResponse`] - Transport-neutral HTTP exchange
//! - [`codec`] - W3C new-session payload decoding and response encoding

pub mod codec;
pub mod error;
pub mod node;
pub mod types;

pub use error::{CodecError, DistributorError, NodeError, RegistryError};
pub use node::{CreatedSession, Node};
pub use types::*;
