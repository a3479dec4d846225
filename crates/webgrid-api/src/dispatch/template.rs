//! Method and path predicates.

use http::Method;

use webgrid_protocols::GridRequest;

use super::{PathParams, RequestPredicate};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    /// `*`: one or more trailing segments.
    Rest,
}

/// Path template such as `/se/grid/distributor/node/{nodeId}`.
///
/// `{name}` binds exactly one segment and a final `*` matches one or more
/// remaining segments. Empty segments are ignored, so trailing slashes do not
/// matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn new(template: &str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "*" => Segment::Rest,
                _ => match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => Segment::Param(name.to_string()),
                    None => Segment::Literal(s.to_string()),
                },
            })
            .collect();
        Self { segments }
    }

    /// Bind the template against `path`.
    pub fn extract(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = PathParams::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest => return (parts.len() > index).then_some(params),
                Segment::Literal(literal) => {
                    if parts.get(index) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(index)?;
                    params.insert(name.clone(), (*value).to_string());
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

/// Predicate on method and path template. A route without a method accepts
/// any method.
#[derive(Debug, Clone)]
pub struct Route {
    method: Option<Method>,
    template: UrlTemplate,
}

impl Route {
    pub fn new(method: Method, template: &str) -> Self {
        Self {
            method: Some(method),
            template: UrlTemplate::new(template),
        }
    }

    pub fn any(template: &str) -> Self {
        Self {
            method: None,
            template: UrlTemplate::new(template),
        }
    }

    pub fn get(template: &str) -> Self {
        Self::new(Method::GET, template)
    }

    pub fn post(template: &str) -> Self {
        Self::new(Method::POST, template)
    }

    pub fn delete(template: &str) -> Self {
        Self::new(Method::DELETE, template)
    }
}

impl RequestPredicate for Route {
    fn capture(&self, request: &GridRequest) -> Option<PathParams> {
        if let Some(ref method) = self.method {
            if request.method() != method {
                return None;
            }
        }
        self.template.extract(request.path())
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
