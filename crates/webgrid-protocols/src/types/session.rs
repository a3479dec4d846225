//! Session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::capabilities::Capabilities;
use super::ids::{NodeId, SessionId};

/// A live browser session bound to exactly one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub node_id: NodeId,
    /// Base address of the owning node.
    pub uri: Url,
    /// Capabilities actually granted by the node.
    pub capabilities: Capabilities,
    pub start_time: DateTime<Utc>,
}
