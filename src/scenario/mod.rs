// src/scenario/mod.rs

//! Scenario driver: everything around the coordinator.
//!
//! - [`stage`] prepares per-run working directories.
//! - [`org_node`] builds the node command lines.
//! - [`assertions`] checks the git storage once the run is over.
//!
//! [`run_scenario`] strings them together around a [`Coordinator`] run.

pub mod assertions;
pub mod org_node;
pub mod stage;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ScenarioFile;
use crate::engine::{Coordinator, NodePlan, RunPlan, RunReport};
use crate::errors::{E2eError, Result};
use crate::process::ProcessLauncher;
use crate::types::NodeRole;
use crate::watch::{MilestoneSet, RecordSink};

pub use assertions::{assert_refs, missing_refs};
pub use org_node::{org_node_command, LOG_ENV};
pub use stage::{stage, StagedNode, Staging};

/// Inputs that come from the command line rather than the scenario file.
#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    /// Path to the `radicle-org-node` binary.
    pub org_node: PathBuf,
    /// Directory holding the `bootstrap/` and `replicator/` seeds.
    pub workdir: PathBuf,
    /// Give up (and tear everything down) after this long.
    pub timeout: Option<Duration>,
}

/// Build the coordinator plan for a scenario over staged directories.
pub fn build_plan(cfg: &ScenarioFile, org_node: &Path, staging: &Staging) -> RunPlan {
    let node_plan = |section: &crate::config::NodeSection, staged: &StagedNode| NodePlan {
        command: org_node_command(org_node, &cfg.network, section, &staged.identity, &staged.root),
        milestones: MilestoneSet::new(section.milestones.iter().cloned()),
    };

    RunPlan::new(
        node_plan(&cfg.bootstrap, &staging.bootstrap),
        node_plan(&cfg.replicator, &staging.replicator),
    )
}

/// Stage, run and verify one scenario.
pub async fn run_scenario(
    cfg: &ScenarioFile,
    opts: &ScenarioOptions,
    launcher: Arc<dyn ProcessLauncher>,
    sink: Arc<dyn RecordSink>,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let staging = stage(&opts.workdir)?;
    let plan = build_plan(cfg, &opts.org_node, &staging);

    info!(cmd = %plan.bootstrap.command, "bootstrap node command");
    info!(cmd = %plan.replicator.command, "replicator node command");

    let coordinator = Coordinator::new(launcher, sink, plan);
    let run = coordinator.run(cancel);

    let report = match opts.timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result?,
            Err(_) => {
                // Dropping the run future cancels its group and releases
                // both processes; cancel the caller's token too so any
                // sibling work stops.
                cancel.cancel();
                return Err(E2eError::Timeout(limit));
            }
        },
        None => run.await?,
    };

    assert_refs(&[
        (NodeRole::Bootstrap, &staging.bootstrap, cfg.bootstrap.expect_refs.as_slice()),
        (NodeRole::Replicator, &staging.replicator, cfg.replicator.expect_refs.as_slice()),
    ])?;

    info!(
        elapsed = ?report.finished_at.duration_since(report.bootstrap_spawned_at),
        "scenario passed"
    );
    Ok(report)
}
