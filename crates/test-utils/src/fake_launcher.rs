use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use org_node_e2e::process::{LogStream, NodeCommand, NodeProcess, ProcessLauncher};
use org_node_e2e::types::NodeRole;

/// What a fake node writes to its stdout.
#[derive(Debug, Default)]
pub struct NodeScript {
    chunks: Vec<Vec<u8>>,
    delay: Option<Duration>,
    hold_open: bool,
    feed: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl NodeScript {
    /// Write these chunks, then close stdout (as if the node exited).
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// One chunk per line. Lines are written verbatim, so include `\n`.
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::chunks(lines.into_iter().map(|l| l.into().into_bytes()))
    }

    /// Stdout fed by the returned sender. Stays open until the sender is
    /// dropped or the process is killed.
    pub fn channel() -> (Self, mpsc::UnboundedSender<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let script = Self {
            feed: Some(rx),
            hold_open: true,
            ..Self::default()
        };
        (script, tx)
    }

    /// Keep stdout open after the scripted chunks until killed.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Sleep this long before each chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Per-role record of what happened to a fake process.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub role: NodeRole,
    pub command: NodeCommand,
    pub spawned_at: Instant,
    killed: CancellationToken,
    killed_at: Arc<Mutex<Option<Instant>>>,
}

impl LaunchRecord {
    pub fn is_killed(&self) -> bool {
        self.killed.is_cancelled()
    }

    pub fn killed_at(&self) -> Option<Instant> {
        *self.killed_at.lock().unwrap()
    }
}

type LaunchHook = Arc<dyn Fn(NodeRole, &NodeCommand) + Send + Sync>;

/// Launcher whose processes are scripted in-memory streams.
///
/// Launching a role with no script fails with `NotFound`, which stands in
/// for a missing executable.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    scripts: Arc<Mutex<HashMap<NodeRole, NodeScript>>>,
    launches: Arc<Mutex<Vec<LaunchRecord>>>,
    hook: Option<LaunchHook>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, role: NodeRole, script: NodeScript) -> Self {
        self.scripts.lock().unwrap().insert(role, script);
        self
    }

    /// Run `hook` synchronously inside every successful launch.
    pub fn on_launch(mut self, hook: impl Fn(NodeRole, &NodeCommand) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.launches.lock().unwrap().clone()
    }

    pub fn launch_of(&self, role: NodeRole) -> Option<LaunchRecord> {
        self.launches().into_iter().find(|l| l.role == role)
    }

    pub fn launch_order(&self) -> Vec<NodeRole> {
        self.launches().iter().map(|l| l.role).collect()
    }

    /// True when every launched process has been asked to terminate.
    pub fn all_killed(&self) -> bool {
        self.launches().iter().all(LaunchRecord::is_killed)
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, role: NodeRole, command: &NodeCommand) -> io::Result<Box<dyn NodeProcess>> {
        let script = self.scripts.lock().unwrap().remove(&role).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no script for {role}"))
        })?;

        let killed = CancellationToken::new();
        let killed_at = Arc::new(Mutex::new(None));
        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(write_script(script, server, killed.clone()));

        if let Some(hook) = &self.hook {
            hook(role, command);
        }

        self.launches.lock().unwrap().push(LaunchRecord {
            role,
            command: command.clone(),
            spawned_at: Instant::now(),
            killed: killed.clone(),
            killed_at: Arc::clone(&killed_at),
        });

        Ok(Box::new(FakeProcess {
            stdout: Some(Box::pin(client)),
            killed,
            killed_at,
        }))
    }
}

async fn write_script(
    mut script: NodeScript,
    mut server: tokio::io::DuplexStream,
    killed: CancellationToken,
) {
    for chunk in std::mem::take(&mut script.chunks) {
        if let Some(delay) = script.delay {
            tokio::select! {
                _ = killed.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tokio::select! {
            _ = killed.cancelled() => return,
            res = server.write_all(&chunk) => if res.is_err() { return },
        }
    }

    if let Some(mut feed) = script.feed.take() {
        loop {
            tokio::select! {
                _ = killed.cancelled() => return,
                next = feed.recv() => match next {
                    Some(chunk) => {
                        if server.write_all(&chunk).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                },
            }
        }
    }

    if script.hold_open {
        killed.cancelled().await;
    }
    // Dropping `server` closes the fake stdout.
}

struct FakeProcess {
    stdout: Option<LogStream>,
    killed: CancellationToken,
    killed_at: Arc<Mutex<Option<Instant>>>,
}

impl NodeProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    fn take_stdout(&mut self) -> Option<LogStream> {
        self.stdout.take()
    }

    fn start_kill(&mut self) -> io::Result<()> {
        let mut at = self.killed_at.lock().unwrap();
        if at.is_none() {
            *at = Some(Instant::now());
        }
        self.killed.cancel();
        Ok(())
    }
}
