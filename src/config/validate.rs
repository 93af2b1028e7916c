// src/config/validate.rs

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Component, Path};

use crate::config::model::{NetworkSection, NodeSection, RawScenarioFile, ScenarioFile};
use crate::errors::{E2eError, Result};
use crate::types::NodeRole;

impl TryFrom<RawScenarioFile> for ScenarioFile {
    type Error = E2eError;

    fn try_from(raw: RawScenarioFile) -> std::result::Result<Self, Self::Error> {
        validate_scenario(&raw)?;
        Ok(ScenarioFile::new_unchecked(
            raw.network,
            raw.bootstrap,
            raw.replicator,
        ))
    }
}

/// Run every check on a raw scenario.
pub fn validate_scenario(cfg: &RawScenarioFile) -> Result<()> {
    validate_network(&cfg.network)?;
    validate_addresses(cfg)?;
    validate_bootstrap_peer(cfg)?;
    for (role, node) in [
        (NodeRole::Bootstrap, &cfg.bootstrap),
        (NodeRole::Replicator, &cfg.replicator),
    ] {
        validate_milestones(role, node)?;
        validate_expect_refs(role, node)?;
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> E2eError {
    E2eError::ConfigError(msg.into())
}

fn validate_network(net: &NetworkSection) -> Result<()> {
    if net.subgraph.trim().is_empty() {
        return Err(config_error("[network].subgraph must not be empty"));
    }
    if net.rpc_url.trim().is_empty() {
        return Err(config_error("[network].rpc_url must not be empty"));
    }
    if net.orgs.is_empty() {
        return Err(config_error("[network].orgs must list at least one org"));
    }
    if net.urns.is_empty() {
        return Err(config_error("[network].urns must list at least one urn"));
    }
    if net.log_format != "gcp" {
        return Err(config_error(format!(
            "[network].log_format must be \"gcp\" (JSON lines), got \"{}\"",
            net.log_format
        )));
    }
    Ok(())
}

fn parse_addr(role: NodeRole, key: &str, value: &str) -> Result<SocketAddr> {
    value.parse().map_err(|e| {
        config_error(format!(
            "[{role}].{key} is not a socket address ('{value}'): {e}"
        ))
    })
}

fn validate_addresses(cfg: &RawScenarioFile) -> Result<()> {
    let mut seen: HashSet<SocketAddr> = HashSet::new();

    for (role, node) in [
        (NodeRole::Bootstrap, &cfg.bootstrap),
        (NodeRole::Replicator, &cfg.replicator),
    ] {
        for (key, value) in [
            ("listen", &node.listen),
            ("web_server_listen", &node.web_server_listen),
        ] {
            let addr = parse_addr(role, key, value)?;
            if !seen.insert(addr) {
                return Err(config_error(format!(
                    "[{role}].{key} reuses address {addr}; every listener needs its own port"
                )));
            }
        }
    }
    Ok(())
}

fn validate_bootstrap_peer(cfg: &RawScenarioFile) -> Result<()> {
    if cfg.bootstrap.bootstrap_peer.is_some() {
        return Err(config_error(
            "[bootstrap].bootstrap_peer is only valid for the replicator",
        ));
    }

    let Some(peer) = cfg.replicator.bootstrap_peer.as_deref() else {
        return Err(config_error("[replicator].bootstrap_peer is required"));
    };

    let Some((peer_id, addr)) = peer.split_once('@') else {
        return Err(config_error(format!(
            "[replicator].bootstrap_peer must look like <peer-id>@<host:port>, got '{peer}'"
        )));
    };
    if peer_id.is_empty() {
        return Err(config_error("[replicator].bootstrap_peer has an empty peer id"));
    }

    let peer_addr = parse_addr(NodeRole::Replicator, "bootstrap_peer", addr)?;
    let bootstrap_addr = parse_addr(NodeRole::Bootstrap, "listen", &cfg.bootstrap.listen)?;
    if peer_addr != bootstrap_addr {
        return Err(config_error(format!(
            "[replicator].bootstrap_peer points at {peer_addr} but the bootstrap node listens on {bootstrap_addr}"
        )));
    }
    Ok(())
}

fn validate_milestones(role: NodeRole, node: &NodeSection) -> Result<()> {
    let mut seen = HashSet::new();
    for m in node.milestones.iter() {
        if m.trim().is_empty() {
            return Err(config_error(format!("[{role}].milestones contains a blank entry")));
        }
        if !seen.insert(m.as_str()) {
            return Err(config_error(format!(
                "[{role}].milestones lists '{m}' more than once"
            )));
        }
    }
    if node.milestones.is_empty() {
        tracing::warn!(%role, "no milestones configured; node counts as ready immediately");
    }
    Ok(())
}

fn validate_expect_refs(role: NodeRole, node: &NodeSection) -> Result<()> {
    for r in node.expect_refs.iter() {
        let path = Path::new(r);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if r.is_empty() || escapes {
            return Err(config_error(format!(
                "[{role}].expect_refs entry '{r}' must be a relative path inside the git dir"
            )));
        }
    }
    Ok(())
}
