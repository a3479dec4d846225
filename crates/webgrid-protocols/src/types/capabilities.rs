//! Capability sets and capability requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known key naming the browser.
pub const BROWSER_NAME: &str = "browserName";

/// An unordered set of string-keyed attribute values.
///
/// Used both for a node's advertised stereotype and for a single requested
/// alternative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeMap<String, Value>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn browser_name(&self) -> Option<&str> {
        self.0.get(BROWSER_NAME).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge two sets. Fails with the offending key if both define it.
    pub fn merge(&self, other: &Capabilities) -> Result<Capabilities, String> {
        let mut merged = self.0.clone();
        for (key, value) in &other.0 {
            if merged.contains_key(key) {
                return Err(key.clone());
            }
            merged.insert(key.clone(), value.clone());
        }
        Ok(Self(merged))
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Capabilities {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Capabilities {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Client-submitted desired attributes for a new session.
///
/// Holds an ordered list of acceptable alternatives; the first satisfiable
/// alternative wins.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityRequest {
    alternatives: Vec<Capabilities>,
}

impl CapabilityRequest {
    /// A request with exactly one requirement set.
    pub fn single(capabilities: Capabilities) -> Self {
        Self {
            alternatives: vec![capabilities],
        }
    }

    /// A request with ordered alternatives. An empty list is treated as a
    /// single empty (match-anything) alternative.
    pub fn new(alternatives: Vec<Capabilities>) -> Self {
        if alternatives.is_empty() {
            return Self::single(Capabilities::new());
        }
        Self { alternatives }
    }

    pub fn alternatives(&self) -> &[Capabilities] {
        &self.alternatives
    }
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
