// src/scenario/org_node.rs

//! Command lines for `radicle-org-node`.

use std::path::Path;

use crate::config::{NetworkSection, NodeSection};
use crate::process::NodeCommand;

/// Environment variable controlling the children's log verbosity.
pub const LOG_ENV: &str = "RUST_LOG";

/// Build the org-node invocation for one node.
///
/// `--bootstrap` is only emitted when the node section names a bootstrap
/// peer, i.e. for the replicator.
pub fn org_node_command(
    org_node: &Path,
    network: &NetworkSection,
    node: &NodeSection,
    identity: &Path,
    root: &Path,
) -> NodeCommand {
    let mut cmd = NodeCommand::new(org_node)
        .args(["--subgraph", network.subgraph.as_str()])
        .args(["--rpc-url", network.rpc_url.as_str()])
        .arg("--identity")
        .arg(identity.to_string_lossy())
        .arg("--root")
        .arg(root.to_string_lossy())
        .arg("--orgs")
        .arg(network.orgs.join(","))
        .arg("--urns")
        .arg(network.urns.join(","));

    if let Some(peer) = &node.bootstrap_peer {
        cmd = cmd.args(["--bootstrap", peer.as_str()]);
    }

    cmd.args(["--listen", node.listen.as_str()])
        .args(["--web-server-listen", node.web_server_listen.as_str()])
        .args(["--log-format", network.log_format.as_str()])
        .env(LOG_ENV, network.log_level.as_str())
}
