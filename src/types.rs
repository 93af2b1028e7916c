use std::fmt;

use serde::Deserialize;

/// Which of the two org-nodes a process, stream or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Seeded node that must finish its initial ref sync before anything
    /// else starts.
    Bootstrap,
    /// Fresh node that replicates from the bootstrap node.
    Replicator,
}

impl NodeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Bootstrap => "bootstrap",
            NodeRole::Replicator => "replicator",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
