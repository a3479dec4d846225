//! Core data types shared across the grid.

mod capabilities;
mod ids;
mod request;
mod session;
mod status;

pub use capabilities::*;
pub use ids::*;
pub use request::*;
pub use session::*;
pub use status::*;
