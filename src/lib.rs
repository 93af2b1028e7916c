// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod log;
pub mod logging;
pub mod process;
pub mod scenario;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ScenarioFile};
use crate::process::TokioLauncher;
use crate::scenario::{build_plan, run_scenario, stage, ScenarioOptions};
use crate::watch::StdoutSink;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - scenario loading
/// - working-directory staging
/// - the coordinator with the real process launcher and stdout echo
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.scenario)?;

    let opts = ScenarioOptions {
        org_node: args.org_node.clone(),
        workdir: args.workdir.clone(),
        timeout: args.timeout,
    };

    if args.print_commands {
        print_commands(&cfg, &opts)?;
        return Ok(());
    }

    let cancel = CancellationToken::new();

    // Ctrl-C → cancel the run; the coordinator tears both nodes down.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            cancel.cancel();
        });
    }

    let launcher = Arc::new(TokioLauncher);
    let sink = Arc::new(StdoutSink::new(!args.no_color));

    let report = run_scenario(&cfg, &opts, launcher, sink, &cancel).await?;
    debug!(states = ?report.states, "run report");
    Ok(())
}

/// Dry run: stage, then print both node commands.
fn print_commands(cfg: &ScenarioFile, opts: &ScenarioOptions) -> Result<()> {
    let staging = stage(&opts.workdir)?;
    let plan = build_plan(cfg, &opts.org_node, &staging);

    println!("Bootstrap node command: {}", plan.bootstrap.command);
    println!("Replicator node command: {}", plan.replicator.command);
    println!(
        "milestones: bootstrap={} replicator={}",
        plan.bootstrap.milestones.len(),
        plan.replicator.milestones.len()
    );

    debug!("dry-run complete (no execution)");
    Ok(())
}
