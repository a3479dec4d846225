//! Predicate dispatch.
//!
//! Handlers do not match requests themselves. Each one is registered with a
//! [`RequestPredicate`] in a [`CompoundHandler`], a small ordered rule table
//! that invokes the first handler whose predicate accepts the request.

mod compound;
mod template;

use std::collections::HashMap;

use async_trait::async_trait;

use webgrid_protocols::{GridRequest, GridResponse};

use crate::error::DispatchError;

pub use compound::CompoundHandler;
pub use template::{Route, UrlTemplate};

/// Path parameters captured by a predicate, keyed by template name.
pub type PathParams = HashMap<String, String>;

/// Decides whether a rule applies to a request.
pub trait RequestPredicate: Send + Sync {
    /// `Some(params)` when the request matches.
    fn capture(&self, request: &GridRequest) -> Option<PathParams>;

    fn matches(&self, request: &GridRequest) -> bool {
        self.capture(request).is_some()
    }
}

impl<F> RequestPredicate for F
where
    F: Fn(&GridRequest) -> bool + Send + Sync,
{
    fn capture(&self, request: &GridRequest) -> Option<PathParams> {
        self(request).then(PathParams::new)
    }
}

/// Handles one kind of grid request.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError>;
}
