//! Error types for the WebGrid protocol layer.

mod codec;
mod distributor;
mod node;
mod registry;

pub use codec::*;
pub use distributor::*;
pub use node::*;
pub use registry::*;
