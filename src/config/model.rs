// src/config/model.rs

use serde::Deserialize;

/// Scenario file as read from TOML, before validation.
///
/// ```toml
/// [network]
/// subgraph = "https://api.thegraph.com/subgraphs/name/radicle-dev/radicle-orgs"
/// rpc_url = "wss://eth-rinkeby.alchemyapi.io/v2/..."
/// orgs = ["0x0000000000000000000000000000000000000000"]
/// urns = ["rad:git:hnrkjajuucc6zp5eknt3s9xykqsrus44cjimy"]
///
/// [bootstrap]
/// listen = "127.0.0.1:8776"
/// web_server_listen = "127.0.0.1:8336"
/// milestones = ["Setting ref ..."]
///
/// [replicator]
/// listen = "127.0.0.1:8777"
/// web_server_listen = "127.0.0.1:8337"
/// bootstrap_peer = "hyb...@127.0.0.1:8776"
/// milestones = ["Setting ref ..."]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawScenarioFile {
    pub network: NetworkSection,
    pub bootstrap: NodeSection,
    pub replicator: NodeSection,
}

/// Validated scenario. Obtain one through `ScenarioFile::try_from` or
/// [`load_and_validate`](super::load_and_validate).
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub network: NetworkSection,
    pub bootstrap: NodeSection,
    pub replicator: NodeSection,
}

impl ScenarioFile {
    pub(crate) fn new_unchecked(
        network: NetworkSection,
        bootstrap: NodeSection,
        replicator: NodeSection,
    ) -> Self {
        Self {
            network,
            bootstrap,
            replicator,
        }
    }
}

/// `[network]`: settings shared by both org-nodes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSection {
    pub subgraph: String,
    pub rpc_url: String,
    pub orgs: Vec<String>,
    pub urns: Vec<String>,

    /// `RUST_LOG` handed to both children.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Value for `--log-format`. The watchers only understand JSON lines.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_format() -> String {
    "gcp".to_string()
}

/// `[bootstrap]` / `[replicator]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    pub listen: String,
    pub web_server_listen: String,

    /// `<peer-id>@<host:port>` of the bootstrap node. Replicator only.
    #[serde(default)]
    pub bootstrap_peer: Option<String>,

    /// Exact log messages this node must emit.
    #[serde(default)]
    pub milestones: Vec<String>,

    /// Refs that must exist under `<root>/git/` after the run.
    #[serde(default)]
    pub expect_refs: Vec<String>,
}
