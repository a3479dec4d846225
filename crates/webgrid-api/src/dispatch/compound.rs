//! Ordered rule table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use webgrid_protocols::{GridRequest, GridResponse};

use super::{CommandHandler, PathParams, RequestPredicate};
use crate::error::DispatchError;

struct Rule {
    predicate: Box<dyn RequestPredicate>,
    handler: Arc<dyn CommandHandler>,
}

/// Tries its rules in registration order; the first matching predicate's
/// handler serves the request.
#[derive(Default)]
pub struct CompoundHandler {
    rules: Vec<Rule>,
}

impl CompoundHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn with(
        mut self,
        predicate: impl RequestPredicate + 'static,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        self.add(predicate, Arc::new(handler));
        self
    }

    pub fn add(&mut self, predicate: impl RequestPredicate + 'static, handler: Arc<dyn CommandHandler>) {
        self.rules.push(Rule {
            predicate: Box::new(predicate),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RequestPredicate for CompoundHandler {
    fn capture(&self, request: &GridRequest) -> Option<PathParams> {
        self.rules.iter().find_map(|rule| rule.predicate.capture(request))
    }
}

#[async_trait]
impl CommandHandler for CompoundHandler {
    async fn execute(&self, request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(mut captured) = rule.predicate.capture(&request) {
                debug!(rule = index, method = %request.method(), path = %request.path(), "Dispatching");
                for (name, value) in params {
                    captured.entry(name).or_insert(value);
                }
                return rule.handler.execute(request, captured).await;
            }
        }

        Err(DispatchError::NoHandler {
            method: request.method().clone(),
            path: request.path().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "compound_tests.rs"]
mod tests;
