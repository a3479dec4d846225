//! # WebGrid API
//!
//! The grid's single HTTP surface.
//!
//! Every inbound request is converted into a [`GridRequest`](webgrid_protocols::GridRequest)
//! and handed to a [`CompoundHandler`]: an ordered table of
//! (predicate, handler) rules where the first matching rule wins.
//!
//! ```text
//! POST   /session                              -> NewSession      (Distributor)
//! DELETE /session/{sessionId}                  -> EndSession      (Distributor)
//! *      /session/{sessionId}/...              -> ForwardCommand  (Session Registry -> Node)
//! POST   /se/grid/distributor/node             -> AddNode         (Node Registry)
//! DELETE /se/grid/distributor/node/{nodeId}    -> RemoveNode      (Node Registry)
//! GET    /se/grid/session/{sessionId}          -> SessionInfo     (Session Registry)
//! DELETE /se/grid/session/{sessionId}          -> SessionEnded    (Distributor)
//! GET    /status                               -> GridStatus
//! ```

pub mod dispatch;
pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use dispatch::{CommandHandler, CompoundHandler, PathParams, RequestPredicate, Route, UrlTemplate};
pub use error::DispatchError;
pub use http::routes::{build_dispatcher, create_router};
pub use server::{GridServer, GridServerConfig};
pub use state::{AppState, GridSettings};
