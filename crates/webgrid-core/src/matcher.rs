//! Capability matching.
//!
//! A stereotype satisfies a request when every key in the request is present
//! in the stereotype with an equal value. Keys absent from the request are
//! wildcards. Vendor extension keys (`goog:chromeOptions`, `moz:firefoxOptions`,
//! ...) configure the browser rather than select a node and are skipped.

use webgrid_protocols::Capabilities;

fn is_extension_key(key: &str) -> bool {
    key.contains(':')
}

/// Whether `offered` satisfies `requested`.
pub fn matches(requested: &Capabilities, offered: &Capabilities) -> bool {
    requested
        .iter()
        .filter(|(key, _)| !is_extension_key(key))
        .all(|(key, value)| offered.get(key) == Some(value))
}

/// Whether any of a node's stereotypes satisfies `requested`.
pub fn matches_any(requested: &Capabilities, stereotypes: &[Capabilities]) -> bool {
    stereotypes.iter().any(|offered| matches(requested, offered))
}
