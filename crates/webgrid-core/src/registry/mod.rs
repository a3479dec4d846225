//! Registries for nodes and sessions.

mod node;
mod session;

pub use node::{Candidate, NodeRegistry, Reservation};
pub use session::{SessionBinding, SessionRegistry};
