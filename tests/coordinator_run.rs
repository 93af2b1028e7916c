// tests/coordinator_run.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use org_node_e2e::engine::{
    Coordinator, NodePlan, OrchestrationError, RunOutcome, RunPlan, RunState,
};
use org_node_e2e::process::NodeCommand;
use org_node_e2e::types::NodeRole;
use org_node_e2e::watch::MilestoneSet;
use org_node_e2e_test_utils::builders::{
    bootstrap_milestones, error_line, info_line, noise_lines, replicator_milestones,
};
use org_node_e2e_test_utils::fake_launcher::{FakeLauncher, NodeScript};
use org_node_e2e_test_utils::memory_sink::MemorySink;
use org_node_e2e_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn plan() -> RunPlan {
    RunPlan::new(
        NodePlan {
            command: NodeCommand::new("org-node").arg("--listen").arg("127.0.0.1:8776"),
            milestones: MilestoneSet::new(bootstrap_milestones()),
        },
        NodePlan {
            command: NodeCommand::new("org-node").arg("--listen").arg("127.0.0.1:8777"),
            milestones: MilestoneSet::new(replicator_milestones()),
        },
    )
}

fn lines_of(milestones: &[String]) -> Vec<String> {
    milestones.iter().map(|m| info_line(m)).collect()
}

/// Bootstrap output: some chatter, every milestone, then silence until killed.
fn ready_bootstrap() -> NodeScript {
    let mut lines = noise_lines(3);
    lines.extend(lines_of(&bootstrap_milestones()));
    NodeScript::lines(lines).hold_open()
}

fn coordinator(launcher: &FakeLauncher, sink: &Arc<MemorySink>) -> Coordinator {
    Coordinator::new(Arc::new(launcher.clone()), sink.clone(), plan())
}

#[tokio::test]
async fn happy_path_orders_processes_and_tears_down() -> TestResult {
    init_tracing();

    let mut replicator = noise_lines(2);
    replicator.extend(lines_of(&replicator_milestones()));
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, ready_bootstrap())
        .script(NodeRole::Replicator, NodeScript::lines(replicator).hold_open());
    let sink = Arc::new(MemorySink::new());

    let report = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await?;

    assert_eq!(
        report.states,
        vec![
            RunState::Init,
            RunState::BootstrapStarted,
            RunState::BootstrapReady,
            RunState::ReplicatorStarted,
            RunState::Done,
        ]
    );
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap, NodeRole::Replicator]);
    assert!(report.bootstrap_spawned_at <= report.bootstrap_ready_at);
    assert!(report.replicator_spawned_at >= report.bootstrap_ready_at);
    assert!(report.finished_at >= report.replicator_spawned_at);
    assert!(launcher.all_killed());

    // Every bootstrap record before readiness was echoed, in order.
    let bootstrap = sink.messages(NodeRole::Bootstrap);
    assert_eq!(&bootstrap[3..9], bootstrap_milestones().as_slice());
    assert_eq!(sink.count(NodeRole::Replicator), 5);
    Ok(())
}

#[tokio::test]
async fn replicator_is_not_launched_before_readiness() -> TestResult {
    init_tracing();

    // The last bootstrap milestone arrives late; the replicator launch must
    // come after it.
    let milestones = bootstrap_milestones();
    let (script, tx) = NodeScript::channel();
    for line in lines_of(&milestones[..5]) {
        tx.send(line.into_bytes())?;
    }

    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, script)
        .script(
            NodeRole::Replicator,
            NodeScript::lines(lines_of(&replicator_milestones())).hold_open(),
        );
    let sink = Arc::new(MemorySink::new());
    let coordinator = coordinator(&launcher, &sink);

    let started = Instant::now();
    let feeder = {
        let launcher = launcher.clone();
        let last = info_line(&milestones[5]);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap]);
            tx.send(last.into_bytes()).ok();
            tx
        })
    };

    with_timeout(coordinator.run(&CancellationToken::new())).await?;
    let _tx = feeder.await?;

    let bootstrap = launcher.launch_of(NodeRole::Bootstrap).expect("bootstrap launched");
    let replicator = launcher.launch_of(NodeRole::Replicator).expect("replicator launched");
    assert!(replicator.spawned_at >= started + Duration::from_millis(100));
    assert!(replicator.spawned_at > bootstrap.spawned_at);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn external_cancel_before_readiness() -> TestResult {
    init_tracing();

    let partial = lines_of(&bootstrap_milestones()[..2]);
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, NodeScript::lines(partial).hold_open())
        .script(NodeRole::Replicator, NodeScript::lines(Vec::<String>::new()));
    let sink = Arc::new(MemorySink::new());

    let cancel = CancellationToken::new();
    let trigger = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        })
    };

    let result = with_timeout(coordinator(&launcher, &sink).run(&cancel)).await;
    trigger.await?;

    assert!(matches!(result, Err(OrchestrationError::Cancelled)));
    assert_eq!(RunOutcome::of(&result), RunOutcome::Cancelled);
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap]);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn cancelled_token_fails_fast() -> TestResult {
    init_tracing();

    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, ready_bootstrap())
        .script(NodeRole::Replicator, NodeScript::lines(Vec::<String>::new()));
    let sink = Arc::new(MemorySink::new());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = with_timeout(coordinator(&launcher, &sink).run(&cancel)).await;

    assert!(matches!(result, Err(OrchestrationError::Cancelled)));
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn bootstrap_error_before_readiness() -> TestResult {
    init_tracing();

    let mut lines = lines_of(&bootstrap_milestones()[..3]);
    lines.push(error_line("failed to open monorepo"));
    lines.extend(lines_of(&bootstrap_milestones()[3..]));
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, NodeScript::lines(lines).hold_open())
        .script(NodeRole::Replicator, NodeScript::lines(Vec::<String>::new()));
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    match &result {
        Err(OrchestrationError::Record { role, message }) => {
            assert_eq!(*role, NodeRole::Bootstrap);
            assert_eq!(message, "failed to open monorepo");
        }
        other => panic!("expected bootstrap record error, got {other:?}"),
    }
    assert_eq!(
        RunOutcome::of(&result),
        RunOutcome::Failed {
            role: Some(NodeRole::Bootstrap),
            reason: "bootstrap node logged an error: failed to open monorepo".to_string(),
        }
    );
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap]);
    assert_eq!(sink.count(NodeRole::Bootstrap), 4);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn bootstrap_failing_right_after_readiness_never_starts_replicator() -> TestResult {
    init_tracing();

    // Last milestone and the error arrive in the same read.
    let mut chunk = lines_of(&bootstrap_milestones()).concat();
    chunk.push_str(&error_line("boom"));
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, NodeScript::chunks([chunk]).hold_open())
        .script(
            NodeRole::Replicator,
            NodeScript::lines(lines_of(&replicator_milestones())).hold_open(),
        );
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    match result {
        Err(OrchestrationError::Record { role, message }) => {
            assert_eq!(role, NodeRole::Bootstrap);
            assert_eq!(message, "boom");
        }
        other => panic!("expected bootstrap record error, got {other:?}"),
    }
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap]);
    assert_eq!(sink.count(NodeRole::Replicator), 0);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn replicator_error_fails_the_run() -> TestResult {
    init_tracing();

    let ms = replicator_milestones();
    let lines = vec![info_line(&ms[0]), error_line("fetch failed"), info_line(&ms[1])];
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, ready_bootstrap())
        .script(NodeRole::Replicator, NodeScript::lines(lines).hold_open());
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    let err = result.unwrap_err();
    assert_eq!(err.role(), Some(NodeRole::Replicator));
    assert!(err.to_string().contains("fetch failed"));
    assert_eq!(sink.messages(NodeRole::Replicator), vec![ms[0].clone(), "fetch failed".into()]);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn bootstrap_error_after_readiness_aborts_replication() -> TestResult {
    init_tracing();

    let (bootstrap, tx) = NodeScript::channel();
    for line in lines_of(&bootstrap_milestones()) {
        tx.send(line.into_bytes())?;
    }

    // The replicator never finishes; the bootstrap node fails as soon as the
    // replicator has been launched.
    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, bootstrap)
        .script(
            NodeRole::Replicator,
            NodeScript::lines(lines_of(&replicator_milestones()[..1])).hold_open(),
        )
        .on_launch(move |role, _| {
            if role == NodeRole::Replicator {
                tx.send(error_line("peer storage corrupted").into_bytes()).ok();
            }
        });
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    match result {
        Err(OrchestrationError::Record { role, message }) => {
            assert_eq!(role, NodeRole::Bootstrap);
            assert_eq!(message, "peer storage corrupted");
        }
        other => panic!("expected bootstrap record error, got {other:?}"),
    }
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap, NodeRole::Replicator]);
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn replicator_spawn_failure_releases_bootstrap() -> TestResult {
    init_tracing();

    // No replicator script: launching it fails like a missing executable.
    let launcher = FakeLauncher::new().script(NodeRole::Bootstrap, ready_bootstrap());
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    match result {
        Err(OrchestrationError::Spawn(e)) => {
            assert_eq!(e.role, NodeRole::Replicator);
            assert_eq!(e.source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected spawn error, got {other:?}"),
    }
    let bootstrap = launcher.launch_of(NodeRole::Bootstrap).expect("bootstrap launched");
    assert!(bootstrap.is_killed());
    Ok(())
}

#[tokio::test]
async fn bootstrap_spawn_failure_launches_nothing() -> TestResult {
    init_tracing();

    let launcher = FakeLauncher::new();
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    let err = result.unwrap_err();
    assert!(matches!(&err, OrchestrationError::Spawn(e) if e.role == NodeRole::Bootstrap));
    assert!(err.to_string().contains("org-node"));
    assert!(launcher.launches().is_empty());
    Ok(())
}

#[tokio::test]
async fn bootstrap_exiting_before_readiness_is_reported() -> TestResult {
    init_tracing();

    let launcher = FakeLauncher::new()
        .script(
            NodeRole::Bootstrap,
            NodeScript::lines(lines_of(&bootstrap_milestones()[..4])),
        )
        .script(NodeRole::Replicator, NodeScript::lines(Vec::<String>::new()));
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    assert!(matches!(
        result,
        Err(OrchestrationError::StreamEnded { role: NodeRole::Bootstrap, remaining: 2 })
    ));
    assert_eq!(launcher.launch_order(), vec![NodeRole::Bootstrap]);
    Ok(())
}

#[tokio::test]
async fn bootstrap_exiting_during_replication_is_reported() -> TestResult {
    init_tracing();

    // Bootstrap closes stdout right after becoming ready.
    let launcher = FakeLauncher::new()
        .script(
            NodeRole::Bootstrap,
            NodeScript::lines(lines_of(&bootstrap_milestones())),
        )
        .script(NodeRole::Replicator, NodeScript::lines(noise_lines(2)).hold_open());
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    assert!(matches!(
        result,
        Err(OrchestrationError::StreamEnded { role: NodeRole::Bootstrap, remaining: 0 })
    ));
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn replicator_exiting_early_is_reported() -> TestResult {
    init_tracing();

    let launcher = FakeLauncher::new()
        .script(NodeRole::Bootstrap, ready_bootstrap())
        .script(
            NodeRole::Replicator,
            NodeScript::lines(lines_of(&replicator_milestones()[..2])),
        );
    let sink = Arc::new(MemorySink::new());

    let result = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::StreamEnded { role: NodeRole::Replicator, remaining: 1 }
    ));
    assert!(err.to_string().contains("1 milestone(s) outstanding"));
    assert!(launcher.all_killed());
    Ok(())
}

#[tokio::test]
async fn records_split_across_chunks_still_complete_the_run() -> TestResult {
    init_tracing();

    let bootstrap: String = lines_of(&bootstrap_milestones()).concat();
    let replicator: String = lines_of(&replicator_milestones()).concat();
    let split = |s: String, n: usize| -> Vec<Vec<u8>> {
        s.into_bytes().chunks(n).map(<[u8]>::to_vec).collect()
    };

    let launcher = FakeLauncher::new()
        .script(
            NodeRole::Bootstrap,
            NodeScript::chunks(split(bootstrap, 17))
                .with_delay(Duration::from_millis(1))
                .hold_open(),
        )
        .script(NodeRole::Replicator, NodeScript::chunks(split(replicator, 5)).hold_open());
    let sink = Arc::new(MemorySink::new());

    let report = with_timeout(coordinator(&launcher, &sink).run(&CancellationToken::new())).await?;

    assert_eq!(report.states.last(), Some(&RunState::Done));
    assert_eq!(sink.messages(NodeRole::Replicator), replicator_milestones());
    Ok(())
}
